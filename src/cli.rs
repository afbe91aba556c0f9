use crate::config::{DEFAULT_DOWNLOAD_DIR, DEFAULT_REMOTE_DIR, DEFAULT_UPLOAD_DIR};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shotsync")]
#[command(about = "Push and pull screenshot baselines to s3 compatible storage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Maximum number of files transferred at once
    #[arg(short, long, global = true, default_value_t = 4)]
    pub concurrency: usize,

    /// Image extension to transfer, may be repeated (default: png)
    #[arg(short, long = "extension", global = true)]
    pub extensions: Vec<String>,

    /// Print the transfer report as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Test that the configured credentials can reach the bucket
    Check,

    /// Upload local screenshots to a remote directory
    Upload {
        /// Remote directory (key prefix) to upload into
        #[arg(short, long, default_value = DEFAULT_REMOTE_DIR)]
        remote_dir: String,

        /// Local folder searched recursively for images
        #[arg(short, long, default_value = DEFAULT_UPLOAD_DIR)]
        folder: String,
    },

    /// Download screenshots from a remote directory
    Download {
        /// Remote directory (key prefix) to download from
        #[arg(short, long, default_value = DEFAULT_REMOTE_DIR)]
        remote_dir: String,

        /// Local folder the images are written into
        #[arg(short, long, default_value = DEFAULT_DOWNLOAD_DIR)]
        output: String,
    },
}
