use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TimelineError>;

/// Errors raised while parsing a timecode string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimecodeError {
	#[error("Empty timecode")]
	Empty,

	#[error("Timecode '{0}' has more than three fields")]
	TooManyFields(String),

	#[error("Invalid timecode field '{field}' in '{input}'")]
	InvalidField { input: String, field: String },

	#[error("Timecode '{0}' is out of range")]
	Overflow(String),
}

/// Failure reported by the external player link
#[derive(Error, Debug)]
#[error("Player link error: {source}")]
pub struct LinkError {
	#[source]
	source: Box<dyn std::error::Error + Send + Sync>,
}

impl LinkError {
	pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
		Self { source: source.into() }
	}
}

#[derive(Error, Debug)]
pub enum TimelineError {
	#[error("Format error: {0}")]
	Format(#[from] TimecodeError),

	#[error("Invalid cue token '{token}': {reason}")]
	InvalidCue { token: String, reason: String },

	#[error("Parse error on line {line}: {reason}")]
	Parse { line: usize, reason: String },

	#[error("I/O error on {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Timing file has no cues")]
	NoCues,

	#[error("Timeline has no entries")]
	EmptyTimeline,

	#[error("No indicator position configured for channel {0}")]
	UnknownChannel(u8),

	#[error(transparent)]
	Link(#[from] LinkError),
}

impl TimelineError {
	/// Errors the operator can fix without restarting the session
	pub fn is_recoverable(&self) -> bool {
		matches!(self, Self::Format(_) | Self::InvalidCue { .. } | Self::Parse { .. } | Self::NoCues)
	}

	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io { path: path.into(), source }
	}
}
