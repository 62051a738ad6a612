//! Human-facing terminal output: review table, progress spinner, the signing
//! prompt, and the final notification.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use solsend_core::{
    format_lamports_as_sol, truncate_address, Approver, Cluster, Lamports, Notification,
    NotificationStatus, Pubkey, TransferObserver, TransferState, UnsignedTransaction,
};

const SPINNER_TICKS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_TICK_MS: u64 = 80;

pub fn human_header(title: &str) {
    println!(
        "{}",
        "╔═══════════════════════════════════════════════════════════════╗".bright_white()
    );
    println!("{}", format!("║  {:<61}║", title).bright_white());
    println!(
        "{}",
        "╚═══════════════════════════════════════════════════════════════╝".bright_white()
    );
    println!();
}

pub fn render_review_table(
    sender: &Pubkey,
    recipient: &Pubkey,
    amount: Lamports,
    cluster: Cluster,
) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Field").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("From"),
        Cell::new(truncate_address(&sender.to_string())),
    ]);
    table.add_row(vec![
        Cell::new("To"),
        Cell::new(truncate_address(&recipient.to_string())),
    ]);
    table.add_row(vec![
        Cell::new("Amount"),
        Cell::new(format_lamports_as_sol(amount)),
    ]);
    table.add_row(vec![Cell::new("Cluster"), Cell::new(cluster.as_str())]);

    table
}

pub fn print_notification(notification: &Notification) {
    println!();
    let title = match notification.status {
        NotificationStatus::Approved => format!("✓ {}", notification.title).green().bold(),
        NotificationStatus::Failed => format!("✗ {}", notification.title).red().bold(),
        NotificationStatus::Unknown => format!("? {}", notification.title).yellow().bold(),
    };
    println!("{title}");
    println!("{}", notification.message);
    if let Some(url) = &notification.explorer_url {
        println!("{} {}", "Explorer:".bright_white().bold(), url);
    }
    if notification.recoverable {
        println!();
        println!("{}", "Fix the input above and re-run.".yellow());
    }
}

pub fn print_setup_error(err: &anyhow::Error) {
    eprintln!("{} {}", "✗".red(), format!("{err:#}").red());
}

/// Drives a spinner from workflow state changes.
///
/// The spinner is cleared while the signer waits for approval so the prompt
/// is not overdrawn.
pub struct ProgressObserver {
    enabled: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressObserver {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            spinner: Mutex::new(None),
        }
    }

    fn start(&self, message: &str) {
        if !self.enabled {
            return;
        }
        let Ok(mut slot) = self.spinner.lock() else {
            return;
        };
        if let Some(spinner) = slot.as_ref() {
            spinner.set_message(message.to_string());
            return;
        }

        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&SPINNER_TICKS);
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        *slot = Some(spinner);
    }

    fn stop(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(spinner) = slot.take() {
                spinner.finish_and_clear();
            }
        }
    }
}

impl TransferObserver for ProgressObserver {
    fn on_transition(&self, _from: TransferState, to: TransferState) {
        match to {
            TransferState::Idle => {}
            TransferState::ValidatingInput => self.start("Validating..."),
            TransferState::FetchingFreshnessToken => self.start("Fetching recent blockhash..."),
            TransferState::AwaitingSignature => self.stop(),
            TransferState::Broadcasting => self.start("Broadcasting transaction..."),
            TransferState::AwaitingConfirmation => self.start("Awaiting confirmation..."),
            TransferState::Succeeded | TransferState::Failed(_) => self.stop(),
        }
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Asks on the terminal before every signature.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptApprover;

#[async_trait]
impl Approver for PromptApprover {
    async fn approve(&self, transaction: &UnsignedTransaction) -> bool {
        let amount = format_lamports_as_sol(transaction.lamports());
        let recipient = transaction.instruction.to;

        match tokio::task::spawn_blocking(move || prompt_approval(&amount, &recipient)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(err)) => {
                warn!(error = %err, "failed to read approval");
                false
            }
            Err(err) => {
                warn!(error = %err, "approval prompt aborted");
                false
            }
        }
    }
}

fn prompt_approval(amount: &str, recipient: &Pubkey) -> io::Result<bool> {
    println!(
        "{}",
        format!(
            "⚠️  Sign and send {amount} to {}?\n    Type 'yes' to approve, or 'no' to cancel:",
            truncate_address(&recipient.to_string())
        )
        .yellow()
    );
    print!("> ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(is_affirmative(&line))
}

fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer == "y" || answer == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmative_answers() {
        assert!(is_affirmative("yes\n"));
        assert!(is_affirmative(" Y "));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("yes please"));
    }

    #[test]
    fn review_table_lists_transfer_fields() {
        colored::control::set_override(false);
        let table = render_review_table(
            &Pubkey::new([1; 32]),
            &Pubkey::new([2; 32]),
            Lamports::new(1_500_000_000),
            Cluster::Devnet,
        )
        .to_string();

        assert!(table.contains("From"));
        assert!(table.contains("1.50 SOL"));
        assert!(table.contains("devnet"));
    }

    #[test]
    fn disabled_observer_never_spins() {
        let observer = ProgressObserver::new(false);
        observer.on_transition(TransferState::Idle, TransferState::ValidatingInput);
        assert!(observer.spinner.lock().unwrap().is_none());
    }
}
