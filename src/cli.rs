use clap::{Parser, Subcommand};

/// English-correction tutor grounded in a local document corpus
#[derive(Parser, Debug)]
#[command(name = "tutor-rag")]
#[command(version)]
#[command(about = "Conversational language tutor with retrieval over a local corpus", long_about = None)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, env = "TUTOR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive console session (default)
    Chat,

    /// Serve the conversation over HTTP
    Serve {
        /// Bind address; overrides server.host
        #[arg(long)]
        host: Option<String>,

        /// Port; overrides server.port and PORT
        #[arg(long)]
        port: Option<u16>,
    },

    /// Index the corpus once and print the report
    Index,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }
}
