//! One module per control mode; each runs its controller to the end on an
//! open [`Session`](crate::session::Session).

pub mod follow_line;
pub mod goto;
pub mod passive;
