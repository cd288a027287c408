use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConnectionError>;

#[derive(Error, Debug)]
pub enum ConnectionError {
	#[error("Connection refused by {address}")]
	Refused { address: String },

	#[error("Telnet I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Timed out after {timeout:?} while {operation}")]
	Timeout { operation: &'static str, timeout: Duration },

	#[error("Connection closed by VLC")]
	Closed,

	#[error("Unexpected greeting from server: {0:?}")]
	Banner(String),

	#[error("Wrong telnet password")]
	WrongPassword,

	#[error("Command '{command}' requires at least VLC {required}, server runs {server}")]
	OldServerVersion { command: String, required: u32, server: String },

	#[error("Unexpected reply to '{command}': {reply:?}")]
	InvalidResponse { command: String, reply: String },
}

impl ConnectionError {
	/// Whether the player may simply not be listening yet
	pub fn is_not_ready(&self) -> bool {
		matches!(self, Self::Refused { .. })
	}
}
