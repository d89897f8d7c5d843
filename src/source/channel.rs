//! Channel-based data source.
//!
//! Receives uploads via a tokio watch channel, for hosts that push CSV
//! extracts instead of writing them to disk.

use tokio::sync::watch;

use super::{DataSource, Upload};

/// A data source fed by a watch channel.
///
/// Only the most recent upload is kept; one sent while a previous one is
/// still unread replaces it.
///
/// # Example
///
/// ```
/// use vitalwatch::{ChannelSource, DataSource, Upload};
///
/// let (tx, mut source) = ChannelSource::create("ward-feed");
/// tx.send(Some(Upload::new("extract.csv", "patientunitstayid,itemoffset\n"))).unwrap();
/// assert!(source.poll().is_some());
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<Option<Upload>>,
    description: String,
}

impl ChannelSource {
    pub fn new(receiver: watch::Receiver<Option<Upload>>, source_description: &str) -> Self {
        let description = format!("channel: {}", source_description);
        Self {
            receiver,
            description,
        }
    }

    /// Create a sender and the source it feeds.
    pub fn create(source_description: &str) -> (watch::Sender<Option<Upload>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self::new(rx, source_description))
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<Upload> {
        if self.receiver.has_changed().unwrap_or(false) {
            self.receiver.borrow_and_update().clone()
        } else {
            None
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_source_poll() {
        let (tx, mut source) = ChannelSource::create("test");
        assert_eq!(source.description(), "channel: test");

        // Nothing sent yet
        assert!(source.poll().is_none());

        tx.send(Some(Upload::new("a.csv", "patientunitstayid,itemoffset\n")))
            .unwrap();
        let upload = source.poll().unwrap();
        assert_eq!(upload.origin, "a.csv");

        // Consumed
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_channel_source_keeps_latest() {
        let (tx, mut source) = ChannelSource::create("test");
        tx.send(Some(Upload::new("a.csv", "1"))).unwrap();
        tx.send(Some(Upload::new("b.csv", "2"))).unwrap();
        assert_eq!(source.poll().unwrap().origin, "b.csv");
        assert!(source.poll().is_none());
    }
}
