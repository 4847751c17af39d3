use clap::{Args, Parser, Subcommand};
use pw_core::config::BackendKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "playwire")]
#[command(author, version, about = "Drive MPlayer or MPV as an external playback backend")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play one item, printing notifications as JSON lines
    ///
    /// Commands are read from stdin, one per line: a JSON player command,
    /// `quit`, `pause`, `step`, `screenshot`, or `raw <backend line>`.
    Play {
        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Print the backend arguments that `play` would use
    Args {
        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Check which backends are installed
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct LaunchArgs {
    /// File path, URL, or disc locator such as dvd://2
    #[arg(required = true)]
    pub locator: String,

    /// Backend to drive (mplayer or mpv); overrides the config
    #[arg(short, long)]
    pub backend: Option<BackendKind>,

    /// Backend executable; skips discovery
    #[arg(long)]
    pub player: Option<PathBuf>,

    /// Start position in seconds
    #[arg(long)]
    pub start: Option<f64>,

    /// Initial volume (0-100)
    #[arg(long)]
    pub volume: Option<u32>,

    /// Start muted
    #[arg(long)]
    pub mute: bool,

    /// Playback speed factor
    #[arg(long)]
    pub speed: Option<f64>,

    /// OSD level (0-3); overrides the config
    #[arg(long)]
    pub osd_level: Option<u8>,

    /// Audio track id
    #[arg(long)]
    pub aid: Option<u32>,

    /// External subtitle file to load (repeatable)
    #[arg(long = "sub-file")]
    pub sub_files: Vec<PathBuf>,

    /// Directory for screenshots
    #[arg(long)]
    pub screenshot_dir: Option<PathBuf>,

    /// File that stream capture writes to
    #[arg(long)]
    pub capture_file: Option<PathBuf>,

    /// Extra arguments passed to the backend verbatim
    #[arg(last = true)]
    pub extra: Vec<String>,
}
