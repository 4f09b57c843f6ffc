use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "photolib-bridge",
    about = "Bridge a device photo library to host application shells"
)]
pub struct Cli {
    /// Library manifest exported by the host platform
    #[arg(
        short = 'm',
        long,
        env = "PHOTOLIB_MANIFEST",
        default_value = "~/.photolib-bridge/manifest.json"
    )]
    pub manifest: String,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream the filtered library as NDJSON batches on stdout
    Export(ExportArgs),
    /// List album collections
    Albums,
    /// Write a thumbnail payload to a file
    Thumbnail(ThumbnailArgs),
    /// Print an item's bytes as base64
    Item(ItemArgs),
    /// Save an image into the library
    SaveImage(SaveArgs),
    /// Save a video into the library
    SaveVideo(SaveArgs),
    /// Print the current authorization state
    Auth(AuthArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Don't include images
    #[arg(long)]
    pub skip_images: bool,

    /// Don't include videos
    #[arg(long)]
    pub skip_videos: bool,

    /// Exclude assets sourced from cloud libraries
    #[arg(long)]
    pub no_cloud_data: bool,

    /// Stop after this many items (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    pub max_items: usize,

    /// Flush a chunk after this many items (0 = no count-based flush)
    #[arg(long, default_value_t = 0)]
    pub items_in_chunk: usize,

    /// Flush a chunk after this many seconds (0 = no time-based flush)
    #[arg(long, default_value_t = 0.0)]
    pub chunk_time_sec: f64,

    /// Report original file names (slower on real backends)
    #[arg(long)]
    pub use_original_file_names: bool,

    /// Include album membership for every item
    #[arg(long)]
    pub include_album_data: bool,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}

#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Asset identifier
    #[arg(long)]
    pub id: String,

    /// Thumbnail width in pixels
    #[arg(long, default_value_t = 512)]
    pub width: u32,

    /// Thumbnail height in pixels
    #[arg(long, default_value_t = 384)]
    pub height: u32,

    /// Encoding quality in 0..=1
    #[arg(long, default_value_t = 0.8)]
    pub quality: f32,

    /// Output file for the payload bytes
    #[arg(short = 'o', long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct ItemArgs {
    /// Asset identifier
    #[arg(long)]
    pub id: String,

    /// Declared mime type, routes image vs. video retrieval
    #[arg(long)]
    pub mime_type: String,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Source: data: URL, http(s) URL, or local path
    #[arg(long)]
    pub url: String,

    /// Target album title (created when absent)
    #[arg(long)]
    pub album: String,
}

#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Request authorization instead of only reporting it
    #[arg(long)]
    pub request: bool,
}
