//! Report delivery: addressing, subjects, attachments and the mailer seam.
//!
//! [`Mailer`] is the async trait a transport implements. [`DryRunMailer`]
//! only logs and [`OutboxMailer`] writes messages to disk; real transports
//! live outside this crate. Every delivery is recorded with
//! [`append_delivery_log`].

mod directory;
mod log;
mod mailer;

pub use directory::{Coordinator, CoordinatorDirectory};
pub use log::{DeliveryLogEntry, append_delivery_log};
pub use mailer::{DryRunMailer, OutboxMailer};

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analyzers::aggregate::is_email;
use crate::report::InstructorSummary;

const SUBJECT_PREFIX: &str = "Informe final – M2 (Alistamiento + Ejecución)";
const SUBJECT_GLOBAL: &str =
    "Informe Global – M2 (Alistamiento + Ejecución) – Rectoría Centro Sur";
const TEST_PREFIX: &str = "[PRUEBA] ";

/// A fully addressed message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    /// Recipients joined with `"; "`.
    pub to: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

/// Sends one message.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Instructor,
    Program,
    Global,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Instructor => "docente",
            ReportKind::Program => "programa",
            ReportKind::Global => "global",
        }
    }
}

/// Addressing parameters shared by every delivery of a run.
#[derive(Debug, Clone, Default)]
pub struct DeliveryOptions {
    /// Overrides every recipient and marks subjects as a test run.
    pub force_to: Option<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Option<String>,
    pub global_to: Vec<String>,
}

impl DeliveryOptions {
    pub fn is_test_run(&self) -> bool {
        self.force_to.is_some()
    }

    /// Recipient of an instructor report: the forced address, else the instructor's e-mail.
    pub fn instructor_recipient(&self, summary: &InstructorSummary) -> Option<String> {
        self.force_to
            .clone()
            .or_else(|| summary.email.clone())
            .filter(|to| is_email(to))
    }

    /// Recipient of a program report: the forced address, else the program coordinator.
    pub fn program_recipient(
        &self,
        program: &str,
        directory: Option<&CoordinatorDirectory>,
    ) -> Option<String> {
        if let Some(forced) = &self.force_to {
            return Some(forced.clone());
        }
        directory
            .and_then(|d| d.get(program))
            .map(|c| c.email.clone())
            .filter(|email| is_email(email))
    }

    pub fn global_recipients(&self) -> Vec<String> {
        match &self.force_to {
            Some(forced) => vec![forced.clone()],
            None => self.global_to.clone(),
        }
    }

    pub fn subject(&self, kind: ReportKind, label: &str, date: &str) -> String {
        let subject = match kind {
            ReportKind::Global => format!("{SUBJECT_GLOBAL} – {date}"),
            ReportKind::Instructor | ReportKind::Program => {
                format!("{SUBJECT_PREFIX} – {label} – {date}")
            }
        };
        if self.is_test_run() {
            format!("{TEST_PREFIX}{subject}")
        } else {
            subject
        }
    }

    pub fn message(
        &self,
        to: &[String],
        subject: String,
        body: String,
        attachments: Vec<PathBuf>,
    ) -> OutgoingMessage {
        let join = |list: &[String]| (!list.is_empty()).then(|| list.join("; "));
        OutgoingMessage {
            to: to.join("; "),
            cc: join(&self.cc),
            bcc: join(&self.bcc),
            reply_to: self.reply_to.clone(),
            subject,
            body,
            attachments,
        }
    }
}

/// Splits an address list on `;` when present, otherwise on `,`.
pub fn parse_emails(raw: &str) -> Vec<String> {
    let sep = if raw.contains(';') { ';' } else { ',' };
    raw.split(sep)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keeps the attachment paths that exist, warning about the rest.
pub fn resolve_attachments<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|p| {
            let path = p.as_ref();
            match std::fs::canonicalize(path) {
                Ok(resolved) => Some(resolved),
                Err(_) => {
                    warn!(path = %path.display(), "Attachment does not exist, skipping");
                    None
                }
            }
        })
        .collect()
}

/// Sends `message` and records it in the delivery log at `log_path`.
pub async fn deliver(
    mailer: &dyn Mailer,
    log_path: &Path,
    kind: ReportKind,
    message: &OutgoingMessage,
) -> Result<()> {
    mailer.send(message).await?;

    let attachments: Vec<String> = message
        .attachments
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    append_delivery_log(
        log_path,
        &DeliveryLogEntry {
            sent_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: kind.as_str().to_string(),
            to: message.to.clone(),
            subject: message.subject.clone(),
            attachments: attachments.join(";"),
        },
    )?;

    info!(
        kind = kind.as_str(),
        to = %message.to,
        attachments = message.attachments.len(),
        "Report delivered"
    );
    Ok(())
}
