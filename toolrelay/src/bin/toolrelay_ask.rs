//! Sends each message to the agent in order and prints the answers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use toolrelay::{AppConfig, connect_runtime, init_logging};

const DEFAULT_SCRIPT: [&str; 2] = [
    "In which year did WW2 start?",
    "How much is bitcoin price in usd?",
];

#[derive(Parser, Debug)]
#[command(
    name = "toolrelay-ask",
    version,
    about = "Ask the tool-calling agent one or more questions"
)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Messages sent in order within one conversation
    messages: Vec<String>,
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

    let messages = if args.messages.is_empty() {
        DEFAULT_SCRIPT.iter().map(|message| message.to_string()).collect()
    } else {
        args.messages
    };

    let mut session = runtime.session();
    let mut status = ExitCode::SUCCESS;
    for message in messages {
        println!("User Message:\n> {message}\n");
        match session.send_message(message).await {
            Ok(answer) => println!("Agent Answer:\n> {answer}\n"),
            Err(error) => {
                eprintln!("Error getting answer from the agent: {error}");
                status = ExitCode::FAILURE;
                break;
            }
        }
    }

    runtime.close().await;
    status
}
