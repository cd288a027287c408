use crate::error::{Error, Result};
use clap::{Parser, ValueEnum};
use cue_timeline::{ChannelCodec, SlideCodec};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vlc_telnet::{VlcConfig, DEFAULT_PORT};

/// What the operator's keypresses record during this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
	/// Sync slide changes to the video (pause, type the slide number, resume)
	Slides,
	/// Switch the highlighted camera channel with single keypresses
	Stream,
}

impl std::fmt::Display for Mode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Slides => write!(f, "slides"),
			Self::Stream => write!(f, "stream"),
		}
	}
}

#[derive(Parser, Debug, Clone)]
#[command(name = "slide-sync")]
#[command(about = "Record and replay slide / camera cues against a running VLC", long_about = None)]
pub struct Config {
	/// Session mode
	#[arg(value_enum, default_value_t = Mode::Slides)]
	pub mode: Mode,

	/// Project directory holding `video/`, `slides/` and the timing files
	#[arg(long, env = "PROJECT_DIR", default_value = ".")]
	pub project_dir: PathBuf,

	/// VLC telnet host
	#[arg(long, env = "VLC_HOST", default_value = "::1")]
	pub vlc_host: String,

	/// VLC telnet port
	#[arg(long, env = "VLC_PORT", default_value_t = DEFAULT_PORT)]
	pub vlc_port: u16,

	/// VLC telnet password
	#[arg(long, env = "VLC_PASSWORD", default_value = "admin")]
	pub vlc_password: String,

	/// Player executable started with the telnet interface enabled
	#[arg(long, env = "VLC_COMMAND", default_value = "vlc")]
	pub player_command: String,

	/// Attach to an already running player instead of starting one
	#[arg(long)]
	pub no_launch: bool,

	/// Text editor used to open the timing files
	#[arg(long, env = "CUE_EDITOR")]
	pub editor: Option<String>,

	/// Indicator image for the active camera channel
	#[arg(long, env = "INDICATOR_IMAGE")]
	pub indicator: Option<PathBuf>,

	/// Polling interval in milliseconds
	#[arg(long, env = "TICK_INTERVAL_MS", default_value_t = 50)]
	pub tick_ms: u64,

	/// How many times to try reaching the player while it starts up
	#[arg(long, env = "VLC_CONNECT_ATTEMPTS", default_value_t = 30)]
	pub connect_attempts: usize,
}

impl Config {
	/// Validate configuration values
	pub fn validate(&self) -> Result<()> {
		if self.tick_ms == 0 {
			return Err(Error::Config("tick_ms must be greater than 0".to_string()));
		}

		if self.connect_attempts == 0 {
			return Err(Error::Config("connect_attempts must be at least 1".to_string()));
		}

		if self.vlc_password.is_empty() {
			return Err(Error::Config("vlc_password must not be empty".to_string()));
		}

		Ok(())
	}

	pub fn tick_interval(&self) -> Duration {
		Duration::from_millis(self.tick_ms)
	}

	pub fn vlc_config(&self) -> VlcConfig {
		VlcConfig {
			host: self.vlc_host.clone(),
			port: self.vlc_port,
			password: self.vlc_password.clone(),
			..VlcConfig::default()
		}
	}
}

/// Resolved project directory and the files derived from it
#[derive(Debug, Clone)]
pub struct Project {
	pub root: PathBuf,
	pub name: String,
}

impl Project {
	pub fn resolve(dir: &Path) -> Result<Self> {
		let root = dir
			.canonicalize()
			.map_err(|e| Error::Config(format!("project directory {} is not accessible: {e}", dir.display())))?;
		let name = root
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.ok_or_else(|| Error::Config(format!("project directory {} has no name", root.display())))?;
		Ok(Self { root, name })
	}

	pub fn slide_timings(&self) -> PathBuf {
		self.root.join(format!("slide_timings--{}.txt", self.name))
	}

	pub fn stream_timings(&self) -> PathBuf {
		self.root.join(format!("streams_timings--{}.txt", self.name))
	}

	/// Every timing file the session keeps live, slides first
	pub fn timing_files(&self) -> [PathBuf; 2] {
		[self.slide_timings(), self.stream_timings()]
	}

	pub fn video_dir(&self) -> PathBuf {
		self.root.join("video")
	}

	pub fn slide_codec(&self) -> SlideCodec {
		SlideCodec::new(self.root.join("slides"))
	}

	pub fn channel_codec(&self, indicator: Option<&Path>) -> ChannelCodec {
		let indicator = indicator.map_or_else(|| self.root.join("indicators").join("recording.png"), Path::to_path_buf);
		ChannelCodec::new(indicator)
	}
}
