use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "studio")]
#[command(version, about = "Generate, preview and publish static sites from a prompt", long_about = None)]
pub struct Args {
    /// Base URL of the studio server
    #[arg(long, global = true, env = "STUDIO_SERVER_URL", default_value = "http://127.0.0.1:3001")]
    pub server_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a prompt and print every step the model took
    Generate {
        /// What to build, e.g. "a portfolio site for a photographer"
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the project's file tree
    Files {
        /// Only show top-level folders
        #[arg(long)]
        collapsed: bool,
    },

    /// Compose a single-page preview of the project
    Preview {
        /// HTML file to anchor the preview on
        #[arg(short, long)]
        file: Option<String>,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Deploy the folder containing a project file
    Publish {
        /// Any path inside the site folder, e.g. portfolio/index.html
        path: String,

        /// Seconds shown on the countdown
        #[arg(long, default_value_t = 60)]
        countdown_secs: u64,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 240)]
        deadline_secs: u64,
    },
}
