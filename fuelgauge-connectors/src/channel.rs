//! In-process source over a bounded tokio channel

use tokio::sync::mpsc;

use crate::{ConnectorError, SampleSource};

/// Receives payloads sent through a paired [`mpsc::Sender`]
///
/// The source closes once every sender is dropped and the buffer drained.
pub struct ChannelSource {
    receiver: mpsc::Receiver<Vec<u8>>,
    capacity: usize,
}

impl ChannelSource {
    /// New source buffering up to `capacity` payloads, plus its sender
    pub fn new(capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self { receiver, capacity })
    }
}

#[async_trait::async_trait]
impl SampleSource for ChannelSource {
    async fn next_payload(&mut self) -> Result<Option<Vec<u8>>, ConnectorError> {
        Ok(self.receiver.recv().await)
    }

    fn describe(&self) -> String {
        format!("channel({})", self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn yields_then_closes() {
        let (sender, mut source) = ChannelSource::new(4);
        sender.send(b"a".to_vec()).await.unwrap();
        sender.send(b"b".to_vec()).await.unwrap();
        drop(sender);

        assert_eq!(source.next_payload().await.unwrap(), Some(b"a".to_vec()));
        assert_eq!(source.next_payload().await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(source.next_payload().await.unwrap(), None);
    }

    #[test]
    fn zero_capacity_is_bumped() {
        let (_sender, source) = ChannelSource::new(0);
        assert_eq!(source.describe(), "channel(1)");
    }
}
