//! The transport seam
//!
//! The engine never talks wire protocols itself. It hands a fully rendered
//! message to a [`Transport`] and observes success or failure —
//! synchronously, from the executor's point of view, whatever the transport
//! does internally.

use std::{
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use herald_common::EmailAddress;
use thiserror::Error;
use tracing::debug;

/// Why a transport call failed. Per-recipient and never fatal: the
/// executor records the failure and moves on.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport rejected or could not deliver the message.
    #[error("send failed: {0}")]
    Failure(String),

    /// I/O failure in the transport itself.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An external message transport.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the message could not be handed
    /// off.
    async fn send(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), TransportError>;
}

/// File-backed transport for dry runs: every message becomes a file in an
/// outbox directory instead of going anywhere. Used by the CLI's dry-run
/// mode and by tests.
#[derive(Debug)]
pub struct FileOutboxTransport {
    outbox: PathBuf,
    sequence: AtomicU64,
}

impl FileOutboxTransport {
    #[must_use]
    pub fn new(outbox: impl Into<PathBuf>) -> Self {
        Self {
            outbox: outbox.into(),
            sequence: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl Transport for FileOutboxTransport {
    async fn send(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), TransportError> {
        tokio::fs::create_dir_all(&self.outbox).await?;

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let name = format!(
            "{sequence:04}_{}.txt",
            recipient.as_str().replace('@', "_at_")
        );
        let path = self.outbox.join(name);

        let content = format!("To: {recipient}\nSubject: {subject}\n\n{body}");
        tokio::fs::write(&path, content).await?;

        debug!(path = %path.display(), "Wrote message to outbox");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outbox_writes_sequenced_files() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FileOutboxTransport::new(dir.path().join("outbox"));
        let recipient = EmailAddress::parse("user@example.org").unwrap();

        transport.send(&recipient, "Hi", "First").await.unwrap();
        transport.send(&recipient, "Hi", "Second").await.unwrap();

        let mut names: Vec<_> = std::fs::read_dir(dir.path().join("outbox"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();

        assert_eq!(names, vec![
            "0001_user_at_example.org.txt",
            "0002_user_at_example.org.txt",
        ]);

        let content =
            std::fs::read_to_string(dir.path().join("outbox").join(&names[0])).unwrap();
        assert!(content.starts_with("To: user@example.org\nSubject: Hi\n\nFirst"));
    }
}
