use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod render;

#[derive(Parser)]
#[command(name = "testa")]
#[command(about = "testa - terminal chat over a hosted data-analysis assistant", long_about = None)]
struct Cli {
    /// Also write logs to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a chat session from a launch token
    Chat {
        /// Encrypted session token
        #[arg(long, env = "TESTA_DATA")]
        data: String,
        /// Continue an existing thread instead of starting a new one
        #[arg(long)]
        thread: Option<String>,
    },
    /// Show the cost table
    Prices {
        /// Only show this model
        #[arg(long)]
        model: Option<String>,
    },
    /// Issue a launch token
    EncodeToken {
        /// Base64 token key; defaults to the configured one
        #[arg(long)]
        key: Option<String>,
        /// API key embedded in the token
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: String,
        /// Assistant id
        #[arg(long)]
        assistant: String,
        /// Input file as `id:name`; repeatable
        #[arg(long = "file")]
        files: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose)?;

    match cli.command {
        Commands::Chat { data, thread } => commands::chat::run(&data, thread.as_deref()).await?,
        Commands::Prices { model } => commands::prices::run(model.as_deref())?,
        Commands::EncodeToken {
            key,
            api_key,
            assistant,
            files,
        } => commands::token::encode(key, api_key, assistant, &files)?,
    }

    Ok(())
}
