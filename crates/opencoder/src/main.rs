//! OpenCoder - a terminal AI coding assistant

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

use commands::{chat_command, init_command, status_command, task_command, RunOptions};

/// OpenCoder - AI coding assistant for your terminal
#[derive(Parser)]
#[command(name = "opencoder")]
#[command(about = "A terminal AI coding assistant")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Chat {
        /// Provider to use (openai, anthropic, ollama)
        #[arg(short, long)]
        provider: Option<String>,
        /// Model name
        #[arg(short, long)]
        model: Option<String>,
        /// Sampling temperature
        #[arg(short, long)]
        temperature: Option<f32>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Run a single task and exit
    Task {
        /// The request to process
        prompt: String,
        /// Provider to use (openai, anthropic, ollama)
        #[arg(short, long)]
        provider: Option<String>,
        /// Model name
        #[arg(short, long)]
        model: Option<String>,
        /// Sampling temperature
        #[arg(short, long)]
        temperature: Option<f32>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Write a default config file
    Init,
    /// Show configured providers and settings
    Status,
}

fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt::init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            provider,
            model,
            temperature,
            verbose,
        } => {
            init_tracing(verbose);
            let options = RunOptions {
                provider,
                model,
                temperature,
            };
            if let Err(e) = chat_command(options).await {
                error!("Chat failed: {e:#}");
                std::process::exit(1);
            }
        }
        Commands::Task {
            prompt,
            provider,
            model,
            temperature,
            verbose,
        } => {
            init_tracing(verbose);
            let options = RunOptions {
                provider,
                model,
                temperature,
            };
            if let Err(e) = task_command(prompt, options).await {
                error!("Task failed: {e:#}");
                std::process::exit(1);
            }
        }
        Commands::Init => {
            init_tracing(false);
            if let Err(e) = init_command().await {
                error!("Init failed: {e:#}");
                std::process::exit(1);
            }
        }
        Commands::Status => {
            init_tracing(false);
            if let Err(e) = status_command().await {
                error!("Status failed: {e:#}");
                std::process::exit(1);
            }
        }
    }
}
