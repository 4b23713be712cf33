use clap::{Parser, Subcommand};

/// `riddlechat` - play the AI riddle game from a terminal.
#[derive(Parser, Debug)]
#[command(name = "riddlechat")]
#[command(version)]
#[command(about = "Terminal client for the AI riddle chat game.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Riddle service URL (overrides config and RIDDLECHAT_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a room and play interactively
    Play {
        /// Join this room instead of creating a random one
        #[arg(long)]
        room: Option<u64>,

        /// Continue a room saved in local history
        #[arg(long, requires = "room")]
        resume: bool,
    },

    /// Show conversations saved on this machine
    History {
        /// Print the full transcript of one saved room
        #[arg(long, conflicts_with = "clear")]
        show: Option<u64>,

        /// Delete all saved conversations
        #[arg(long)]
        clear: bool,
    },

    /// List rooms known to the riddle service
    Rooms,
}
