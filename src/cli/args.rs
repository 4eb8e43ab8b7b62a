// src/cli/args.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
#[command(arg_required_else_help = true, disable_help_subcommand = true)]
pub struct Args {
    /// Path to config file (optional)
    #[arg(long, value_name = "CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory, overrides the config file (optional)
    #[arg(short, long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start a session as USERNAME
    SignIn {
        #[arg(value_name = "USERNAME")]
        username: String,
    },

    /// End the current session
    SignOut,

    /// Show the signed-in user
    Whoami,

    /// List notes with their image URLs
    List {
        /// Output notes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a note, optionally with an image
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short = 'D', long)]
        description: String,

        /// Image file to attach
        #[arg(short, long, value_name = "PATH")]
        image: Option<PathBuf>,
    },

    /// Delete a note
    Delete {
        #[arg(value_name = "NOTE_ID")]
        note_id: String,
    },

    /// Open the notes page in the browser
    View,
}
