//! Machine-readable output for non-interactive callers.
//!
//! Successful transfers print a single JSON object on stdout; every other
//! outcome goes to stderr so pipelines can tell them apart without parsing.

use std::io::{self, Write};

use anyhow::{Context, Result};

use solsend_core::{AgentError, Notification, NotificationStatus};

pub fn emit_agent_error(err: &AgentError) -> Result<()> {
    let json = serde_json::to_string(err).context("failed to serialize agent error")?;
    eprintln!("{json}");
    Ok(())
}

pub fn emit_notification(notification: &Notification) -> Result<()> {
    let json =
        serde_json::to_string(notification).context("failed to serialize notification")?;
    if notification.status == NotificationStatus::Approved {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{json}").context("failed to write to stdout")?;
    } else {
        eprintln!("{json}");
    }
    Ok(())
}

pub fn confirmation_required() -> AgentError {
    AgentError {
        error: "confirmation_required".to_string(),
        code: 2,
        message: Some("agent mode cannot prompt; pass --force to sign without approval".to_string()),
    }
}

pub fn setup_failed(err: &anyhow::Error) -> AgentError {
    AgentError {
        error: "setup_failed".to_string(),
        code: 1,
        message: Some(format!("{err:#}")),
    }
}
