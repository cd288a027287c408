use cue_timeline::{LinkError, TimelineError};
use thiserror::Error;
use vlc_telnet::ConnectionError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
	#[error("Timeline error: {0}")]
	Timeline(#[from] TimelineError),

	#[error("VLC connection error: {0}")]
	Connection(#[from] ConnectionError),

	#[error(transparent)]
	Link(#[from] LinkError),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Failed to launch {program}: {source}")]
	Launch {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
