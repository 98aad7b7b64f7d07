use clap::{Parser, Subcommand};
use mailcraft::TransportStrategy;
use mailcraft::prompt::Tone;
use std::path::PathBuf;

/// `Mail Craft` - rewrite email drafts with Gemini.
#[derive(Parser, Debug)]
#[command(name = "mailcraft")]
#[command(version)]
#[command(about = "Rewrite email drafts with a generative AI service.", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.mailcraft/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite an email draft and print it as `Subject:`/`Body:`
    Rewrite {
        /// Preset tone (formal, friendly, concise, persuasive)
        #[arg(short, long)]
        tone: Option<Tone>,

        /// Custom instruction; takes precedence over --tone
        #[arg(short, long)]
        instruction: Option<String>,

        /// Current subject line of the draft
        #[arg(short, long)]
        subject: Option<String>,

        /// Read the draft body from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Transport to the background host (port, one-shot)
        #[arg(long)]
        transport: Option<TransportStrategy>,

        /// Draft body; read from stdin when neither this nor --file is given
        text: Vec<String>,
    },

    /// Check an API key against the service (defaults to the stored key)
    ValidateKey {
        key: Option<String>,
    },

    /// Round-trip a liveness check through the background host
    Ping {
        /// Transport to the background host (port, one-shot)
        #[arg(long)]
        transport: Option<TransportStrategy>,
    },

    /// Show the effective configuration
    Config,
}
