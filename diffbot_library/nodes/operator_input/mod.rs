use crossbeam::channel::{self, Receiver, Sender};
use diffbot_core::error::{DiffbotError, DiffbotResult};
use std::io::BufRead;

/// Operator request delivered to the active controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorEvent {
    /// Switch to the next line color (manual switch mode)
    Advance,
    /// End the run
    Quit,
}

impl OperatorEvent {
    /// Map one input line to an event; unknown input is ignored
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "n" | "next" => Some(OperatorEvent::Advance),
            "q" | "quit" => Some(OperatorEvent::Quit),
            _ => None,
        }
    }
}

/// Line-oriented operator input read on a background thread
///
/// The reader thread is detached: a blocking read on stdin cannot be
/// interrupted, and the thread ends by itself once the input closes or the
/// receiving side is dropped.
pub struct OperatorInput {
    events: Receiver<OperatorEvent>,
}

impl OperatorInput {
    /// Read events from the process stdin
    pub fn from_stdin() -> DiffbotResult<Self> {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> DiffbotResult<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = channel::unbounded();
        std::thread::Builder::new()
            .name("operator-input".to_string())
            .spawn(move || read_events(reader, tx))
            .map_err(|e| {
                DiffbotError::InitializationFailed(format!("cannot spawn input thread: {}", e))
            })?;
        Ok(Self { events: rx })
    }

    /// Wrap an existing channel (used by tests and embedding code)
    pub fn from_receiver(events: Receiver<OperatorEvent>) -> Self {
        Self { events }
    }

    /// All events received since the last call, oldest first
    pub fn drain(&self) -> Vec<OperatorEvent> {
        self.events.try_iter().collect()
    }

    pub fn receiver(&self) -> &Receiver<OperatorEvent> {
        &self.events
    }
}

fn read_events<R: BufRead>(reader: R, tx: Sender<OperatorEvent>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "operator input closed");
                return;
            }
        };
        match OperatorEvent::parse(&line) {
            Some(event) => {
                tracing::debug!(?event, "operator event");
                if tx.send(event).is_err() {
                    return;
                }
            }
            None => tracing::warn!(input = %line.trim(), "unknown operator input (Enter/n = next color, q = quit)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn test_parse() {
        assert_eq!(OperatorEvent::parse(""), Some(OperatorEvent::Advance));
        assert_eq!(OperatorEvent::parse("  N \n"), Some(OperatorEvent::Advance));
        assert_eq!(OperatorEvent::parse("q"), Some(OperatorEvent::Quit));
        assert_eq!(OperatorEvent::parse("Quit"), Some(OperatorEvent::Quit));
        assert_eq!(OperatorEvent::parse("jump"), None);
    }

    #[test]
    fn test_reader_thread_delivers_in_order() {
        let input = OperatorInput::from_reader(Cursor::new("n\nbogus\n\nq\n")).unwrap();
        let mut events = Vec::new();
        while events.len() < 3 {
            match input.receiver().recv_timeout(Duration::from_secs(2)) {
                Ok(event) => events.push(event),
                Err(e) => panic!("missing events: {:?}", e),
            }
        }
        assert_eq!(
            events,
            vec![OperatorEvent::Advance, OperatorEvent::Advance, OperatorEvent::Quit]
        );
    }

    #[test]
    fn test_drain_empties_channel() {
        let (tx, rx) = channel::unbounded();
        let input = OperatorInput::from_receiver(rx);
        assert!(input.drain().is_empty());
        tx.send(OperatorEvent::Advance).unwrap();
        tx.send(OperatorEvent::Quit).unwrap();
        assert_eq!(input.drain(), vec![OperatorEvent::Advance, OperatorEvent::Quit]);
        assert!(input.drain().is_empty());
    }
}
