//! Command-line entry point for herald
//!
//! Sends one message to every recipient listed in a file, staying under the
//! Bot API's global rate limit.

use std::{path::PathBuf, sync::Arc};

use clap::{Args, Parser, Subcommand};
use herald::{
    config::HeraldConfig,
    dry_run::DryRunTransport,
    markup,
    recipients,
    sinks::{FileBlockedSink, LogProgress},
};
use herald_broadcast::{Broadcaster, Payload, RunOptions, RunStats, Transport, run_blocking};
use herald_common::{internal, logging};
use herald_telegram::TelegramTransport;

/// Rate-limited Telegram broadcasts
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(about = "Broadcast a message to many Telegram chats", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a message to every recipient in a file
    Send(SendArgs),
}

#[derive(Args, Debug)]
struct SendArgs {
    /// File with one chat id per line
    #[arg(short, long)]
    recipients: PathBuf,

    #[command(flatten)]
    message: MessageText,

    /// File id or URL of an image; the text becomes its caption
    #[arg(long)]
    image: Option<String>,

    /// RON file describing an inline keyboard to attach
    #[arg(long, value_name = "FILE")]
    markup: Option<PathBuf>,

    /// Configuration file, instead of searching the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Accept every send without contacting the Bot API
    #[arg(long)]
    dry_run: bool,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct MessageText {
    /// Message text
    #[arg(short, long)]
    text: Option<String>,

    /// Read the message text from a file
    #[arg(long, value_name = "FILE")]
    text_file: Option<PathBuf>,
}

impl MessageText {
    fn resolve(&self) -> anyhow::Result<String> {
        match (&self.text, &self.text_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("Failed to read message text from {}: {e}", path.display())
            }),
            (None, None) => anyhow::bail!("Either --text or --text-file is required"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Send(args) => send(&args),
    }
}

fn send(args: &SendArgs) -> anyhow::Result<()> {
    let config = HeraldConfig::load(args.config.as_deref(), args.dry_run)?;

    let recipients = recipients::read(&args.recipients)?;
    let text = args.message.resolve()?;
    let mut payload = Payload::text(text);
    if let Some(image) = &args.image {
        payload = payload.with_image(image.clone());
    }
    if let Some(path) = &args.markup {
        payload = payload.with_markup(markup::read(path)?);
    }

    let transport: Arc<dyn Transport> = if args.dry_run {
        internal!(level = INFO, "Dry run, nothing will be sent");
        Arc::new(DryRunTransport)
    } else {
        let client = config.telegram.build_client()?;
        Arc::new(TelegramTransport::new(client, config.telegram.clone()))
    };

    let mut broadcaster = Broadcaster::new(config.broadcast.clone(), transport);
    if let Some(path) = &config.blocked_file {
        broadcaster = broadcaster.with_blocked_sink(Arc::new(FileBlockedSink::new(path)));
    }

    let stats = run_blocking(
        &broadcaster,
        recipients,
        payload,
        RunOptions::new().on_progress(Arc::new(LogProgress)),
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats);
    }

    Ok(())
}

fn print_summary(stats: &RunStats) {
    println!("Broadcast finished");
    println!("  Recipients: {}", stats.total_messages);
    println!("  Sent:       {}", stats.success_count);
    println!("  Failed:     {}", stats.failed_count);
    println!("  Blocked:    {}", stats.blocked_count);
    println!(
        "  Duration:   {:.1}s ({:.1} msg/s)",
        stats.duration_seconds, stats.avg_speed
    );
}
