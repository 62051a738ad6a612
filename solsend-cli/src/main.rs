//! solsend: send SOL from a keypair to the configured recipient.
//!
//! amount -> blockhash -> sign -> broadcast -> confirm -> notify

mod agent;
mod logging;
mod operator;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use is_terminal::IsTerminal;
use tracing::debug;

use solsend_core::{
    Activation, Approver, AutoApprove, Cluster, KeypairSigner, Notification, OutputMode, Pubkey,
    RpcLedger, TransferConfig, TransferForm, TransferWorkflow, TriggerState,
};

use crate::logging::{init_logging, LogFormat};
use crate::operator::{ProgressObserver, PromptApprover};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Auto,
    Json,
    Human,
}

/// CLI-only enum to satisfy clap's ValueEnum without adding clap to core.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCluster {
    Devnet,
    Testnet,
    MainnetBeta,
}

impl CliCluster {
    fn to_core(self) -> Cluster {
        match self {
            CliCluster::Devnet => Cluster::Devnet,
            CliCluster::Testnet => Cluster::Testnet,
            CliCluster::MainnetBeta => Cluster::MainnetBeta,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "solsend", version)]
#[command(about = "Send SOL: validate -> fetch blockhash -> sign -> broadcast -> confirm")]
struct Cli {
    /// Amount in SOL (decimal, up to 9 fractional digits).
    #[arg(long, allow_hyphen_values = true)]
    amount: String,

    /// Keypair file (JSON array of 64 bytes). Without it no signer is connected.
    #[arg(long)]
    keypair: Option<PathBuf>,

    /// Recipient address; overrides the configured one.
    #[arg(long)]
    recipient: Option<String>,

    /// Cluster; overrides the configured one.
    #[arg(long, value_enum)]
    cluster: Option<CliCluster>,

    /// RPC endpoint; overrides the cluster default.
    #[arg(long)]
    rpc_url: Option<String>,

    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: auto (tty=human, pipe=agent), json (agent), human (operator).
    #[arg(long, value_enum, default_value = "auto")]
    output: OutputFormat,

    /// Sign without prompting (required for agent mode).
    #[arg(long)]
    force: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

/// Detect output mode based on CLI flags and TTY detection.
fn detect_output_mode(output: OutputFormat) -> OutputMode {
    match output {
        OutputFormat::Human => OutputMode::Human,
        OutputFormat::Json => OutputMode::Agent,
        OutputFormat::Auto => {
            if std::io::stdout().is_terminal() {
                OutputMode::Human
            } else {
                OutputMode::Agent
            }
        }
    }
}

fn load_config(cli: &Cli) -> Result<TransferConfig> {
    let mut config = match &cli.config {
        Some(path) => TransferConfig::from_toml_file(path)?,
        None => TransferConfig::default(),
    };

    if let Some(cluster) = cli.cluster {
        config.cluster = cluster.to_core();
    }
    if let Some(url) = &cli.rpc_url {
        config.rpc_url = Some(url.clone());
    }
    if let Some(recipient) = &cli.recipient {
        config.recipient = recipient
            .parse::<Pubkey>()
            .with_context(|| format!("invalid recipient address '{recipient}'"))?;
    }

    config.validate()?;
    Ok(config)
}

fn load_signer(cli: &Cli) -> Result<KeypairSigner> {
    let approver: Arc<dyn Approver> = if cli.force {
        Arc::new(AutoApprove)
    } else {
        Arc::new(PromptApprover)
    };

    match &cli.keypair {
        Some(path) => KeypairSigner::from_file(path, approver)
            .with_context(|| format!("failed to load keypair from {}", path.display())),
        None => Ok(KeypairSigner::disconnected(approver)),
    }
}

/// Agent stderr carries exactly one JSON payload, so logging stays off there
/// unless `RUST_LOG` asks for it.
fn log_level(mode: OutputMode, config: &TransferConfig) -> &str {
    match mode {
        OutputMode::Human => &config.log_level,
        OutputMode::Agent => "off",
    }
}

async fn run(cli: &Cli, mode: OutputMode) -> Result<i32> {
    let config = load_config(cli)?;
    let ansi = mode == OutputMode::Human && !cli.no_color && std::io::stderr().is_terminal();
    init_logging(
        LogFormat::from_config(&config.log_format),
        log_level(mode, &config),
        ansi,
    );

    let ledger = Arc::new(RpcLedger::from_config(&config).context("failed to create RPC client")?);
    debug!(cluster = config.cluster.as_str(), rpc = ledger.url(), "configuration loaded");
    let signer = Arc::new(load_signer(cli)?);
    let workflow = TransferWorkflow::new(signer, ledger.clone(), ledger).with_config(&config);

    let form = TransferForm::with_amount(&cli.amount);
    let sender = workflow.signer_identity();

    if mode == OutputMode::Human {
        operator::human_header("SOLSEND · Transfer Review");
        if let (Some(sender), TriggerState::Enabled(amount)) =
            (sender, form.trigger_state(sender.is_some()))
        {
            let table =
                operator::render_review_table(&sender, &config.recipient, amount, config.cluster);
            println!("{table}");
            println!();
        }
    }

    let observer = ProgressObserver::new(mode == OutputMode::Human);
    let activation = form.submit(&workflow, config.recipient, &observer).await;
    drop(observer);

    let notification = match activation {
        Activation::Completed(result) => Notification::from_result(&result, config.cluster),
        Activation::Ignored(reason) => {
            let err = reason
                .as_error()
                .ok_or_else(|| anyhow!("a transfer is already in flight"))?;
            Notification::from_error(&err, config.cluster)
        }
    };

    match mode {
        OutputMode::Human => operator::print_notification(&notification),
        OutputMode::Agent => agent::emit_notification(&notification)?,
    }

    Ok(notification.exit_code())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mode = detect_output_mode(cli.output);

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Agent mode is non-interactive; signing needs consent given up front.
    if mode == OutputMode::Agent && !cli.force {
        if let Err(err) = agent::emit_agent_error(&agent::confirmation_required()) {
            eprintln!("{err:#}");
        }
        std::process::exit(2);
    }

    let code = match run(&cli, mode).await {
        Ok(code) => code,
        Err(err) => {
            match mode {
                OutputMode::Human => operator::print_setup_error(&err),
                OutputMode::Agent => {
                    if let Err(emit_err) = agent::emit_agent_error(&agent::setup_failed(&err)) {
                        eprintln!("{emit_err:#}");
                    }
                }
            }
            1
        }
    };

    std::process::exit(code);
}
