use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use super::{Mailer, OutgoingMessage};
use crate::output::file_stem;

/// Logs each message instead of sending it.
#[derive(Debug, Default)]
pub struct DryRunMailer;

#[async_trait::async_trait]
impl Mailer for DryRunMailer {
    async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "[DRY-RUN] Message not sent"
        );
        Ok(())
    }
}

/// Drops each message as a JSON file into a directory for an external sender to pick up.
#[derive(Debug)]
pub struct OutboxMailer {
    dir: PathBuf,
    sequence: AtomicUsize,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sequence: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create outbox {}", self.dir.display()))?;

        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self
            .dir
            .join(format!("{:04}_{}.json", n, file_stem(&message.subject)));
        let body = serde_json::to_vec_pretty(message)?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write outbox message {}", path.display()))?;

        info!(to = %message.to, path = %path.display(), "Message queued in outbox");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> OutgoingMessage {
        OutgoingMessage {
            to: "ana@uni.edu".into(),
            cc: None,
            bcc: None,
            reply_to: None,
            subject: "Informe final – Ana".into(),
            body: "# Informe".into(),
            attachments: vec![],
        }
    }

    #[tokio::test]
    async fn test_dry_run_does_not_fail() {
        DryRunMailer.send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn test_outbox_writes_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = OutboxMailer::new(dir.path().join("outbox"));
        mailer.send(&message()).await.unwrap();
        mailer.send(&message()).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path().join("outbox"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("0001_"));
        assert!(names[1].starts_with("0002_"));

        let saved = std::fs::read_to_string(dir.path().join("outbox").join(&names[0])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(value["to"], "ana@uni.edu");
    }
}
