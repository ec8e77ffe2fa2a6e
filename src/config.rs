//! Startup configuration
//!
//! All runtime knobs are read once at startup into [`AppConfig`];
//! nothing else in the crate touches the environment. The storage
//! credential is mandatory and its absence is fatal before the server
//! binds.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Text-to-speech delivery service
#[derive(Debug, Parser)]
#[command(name = "voxlink", version, about)]
pub struct AppConfig {
    /// Address to bind
    #[arg(long, env = "VOXLINK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "VOXLINK_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Base64-encoded service-account JSON for the storage backend
    #[arg(long, env = "VOXLINK_DRIVE_CREDENTIALS_B64", hide_env_values = true)]
    pub drive_credentials_b64: String,

    /// Destination folder id for uploads (root of the Drive if unset)
    #[arg(long, env = "VOXLINK_DRIVE_FOLDER")]
    pub drive_folder: Option<String>,

    /// Reference sample cloned at startup as the default voice
    #[arg(long, env = "VOXLINK_DEFAULT_VOICE")]
    pub default_voice: Option<PathBuf>,

    /// Synthesis engine executable
    #[arg(long, env = "VOXLINK_ENGINE_CMD")]
    pub engine_cmd: PathBuf,

    /// Extra arguments passed to the engine before the per-call ones
    #[arg(
        long,
        env = "VOXLINK_ENGINE_ARGS",
        value_delimiter = ' ',
        num_args = 0..,
        allow_hyphen_values = true
    )]
    pub engine_args: Vec<String>,

    /// Per-call synthesis timeout in seconds
    #[arg(long, env = "VOXLINK_ENGINE_TIMEOUT_SECS", default_value_t = 120)]
    pub engine_timeout_secs: u64,

    /// Directory cloned voices are installed into
    #[arg(long, env = "VOXLINK_VOICES_DIR", default_value = "voices")]
    pub voices_dir: PathBuf,

    /// ffmpeg executable used for transcoding
    #[arg(long, env = "VOXLINK_FFMPEG_PATH", default_value = "ffmpeg")]
    pub ffmpeg_path: PathBuf,

    /// Root directory for per-job scratch space
    #[arg(long, env = "VOXLINK_SCRATCH_DIR", default_value = "/tmp/voxlink")]
    pub scratch_dir: PathBuf,
}

impl AppConfig {
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
