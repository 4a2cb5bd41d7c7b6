//! Asks the reminder question on a fixed interval until interrupted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use toolrelay::{
    AgentSession, AppConfig, ChatErrorKind, cancel_on_shutdown, connect_runtime, init_logging,
    timestamp,
};

#[derive(Parser, Debug)]
#[command(
    name = "toolrelay-remind",
    version,
    about = "Periodically ask the agent the configured reminder question"
)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between questions; overrides `reminder.interval_secs`
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match connect_runtime(&config).await {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Agent creation error: {error}");
            return ExitCode::FAILURE;
        }
    };

    let interval = args
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.reminder.interval());
    let question = config.reminder.question.clone();

    println!("=== Reminder Service ===");
    println!("Asking every {}s: {question}", interval.as_secs());
    println!("Press Ctrl+C to stop");
    println!();

    let shutdown = CancellationToken::new();
    cancel_on_shutdown(shutdown.clone());

    let mut session = runtime.session();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => ask(&mut session, &question, &shutdown).await,
        }
    }

    println!("\nShutting down reminder service...");
    runtime.close().await;
    ExitCode::SUCCESS
}

async fn ask(session: &mut AgentSession, question: &str, shutdown: &CancellationToken) {
    println!("[{}] {question}", timestamp());

    match session.send_message_with_cancel(question, shutdown).await {
        Ok(answer) => {
            println!("\n{answer}");
            println!("-----------------------------------------");
            println!();
        }
        Err(error) if error.kind == ChatErrorKind::Cancelled => {}
        Err(error) => println!("[ERROR] {error}\n"),
    }
}
