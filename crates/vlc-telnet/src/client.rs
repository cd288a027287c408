use crate::config::VlcConfig;
use crate::error::{ConnectionError, Result};
use crate::negotiation::TelnetFilter;
use std::future::Future;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

const BANNER_PREFIX: &str = "VLC media player ";
const PASSWORD_PROMPT: &[u8] = b"Password:";
const COMMAND_PROMPT: &[u8] = b">";

/// Connection to a running VLC instance with the telnet interface enabled.
///
/// Start VLC with `--extraintf telnet --telnet-password <password>`.
pub struct VlcClient {
	stream: BufReader<TcpStream>,
	filter: TelnetFilter,
	timeout: Duration,
	server_version: String,
}

impl VlcClient {
	/// Connect and log in
	///
	/// # Errors
	///
	/// [`ConnectionError::Refused`] when nothing listens yet, [`ConnectionError::WrongPassword`] on a rejected
	/// login, or any I/O, timeout or banner failure on the way.
	pub async fn connect(config: &VlcConfig) -> Result<Self> {
		let address = config.address();
		let stream = match with_timeout(config.timeout, "connecting", TcpStream::connect(&address)).await? {
			Ok(stream) => stream,
			Err(e) if e.kind() == ErrorKind::ConnectionRefused => return Err(ConnectionError::Refused { address }),
			Err(e) => return Err(e.into()),
		};

		let mut client = Self {
			stream: BufReader::new(stream),
			filter: TelnetFilter::new(),
			timeout: config.timeout,
			server_version: String::new(),
		};
		client.login(&config.password).await?;
		info!(version = %client.server_version, %address, "Connected to VLC");
		Ok(client)
	}

	/// Connect, waiting for a player that is still starting up.
	///
	/// # Errors
	///
	/// Only a refused connection is retried; anything else is returned immediately.
	pub async fn connect_with_retry(config: &VlcConfig, attempts: usize, delay: Duration) -> Result<Self> {
		let mut attempt = 0;
		loop {
			attempt += 1;
			match Self::connect(config).await {
				Ok(client) => return Ok(client),
				Err(e) if e.is_not_ready() && attempt < attempts => {
					info!(attempt, "Trying to connect to VLC...");
					tokio::time::sleep(delay).await;
				}
				Err(e) => return Err(e),
			}
		}
	}

	pub fn server_version(&self) -> &str {
		&self.server_version
	}

	/// Send a raw command line and return the reply text up to the next prompt
	///
	/// # Errors
	///
	/// Fails when the write or the reply times out, or the connection drops.
	pub async fn send_command(&mut self, line: &str) -> Result<String> {
		debug!(command = line, "Sending VLC command");
		let mut payload = line.as_bytes().to_vec();
		payload.push(b'\n');

		let timeout = self.timeout;
		with_timeout(timeout, "sending a command", self.stream.get_mut().write_all(&payload)).await??;

		let (_, reply) = self.read_until_any(&[COMMAND_PROMPT]).await?;
		Ok(reply)
	}

	/// Elapsed playback time in whole seconds; `0` while nothing is playing
	pub async fn get_time(&mut self) -> Result<u64> {
		let reply = self.send_command("get_time").await?;
		parse_seconds(&reply).ok_or(ConnectionError::InvalidResponse {
			command: "get_time".to_string(),
			reply,
		})
	}

	/// Current playlist status
	pub async fn status(&mut self) -> Result<String> {
		self.require_version("status", 2)?;
		self.send_command("status").await
	}

	/// Add a file to the playlist and start playing it
	pub async fn add(&mut self, file: &Path) -> Result<String> {
		self.send_command(&format!("add {}", file.display())).await
	}

	/// Add a file to the playlist without playing it
	pub async fn enqueue(&mut self, file: &Path) -> Result<String> {
		self.send_command(&format!("enqueue {}", file.display())).await
	}

	pub async fn play(&mut self) -> Result<String> {
		self.send_command("play").await
	}

	/// Pause playback.
	///
	/// VLC's `pause` toggles, so playback is started first to make the result deterministic.
	pub async fn pause(&mut self) -> Result<String> {
		self.play().await?;
		self.send_command("pause").await
	}

	pub async fn seek(&mut self, second: u64) -> Result<String> {
		self.send_command(&format!("seek {second}")).await
	}

	pub async fn stop(&mut self) -> Result<String> {
		self.send_command("stop").await
	}

	/// Point the logo sub-filter instance `layer` at `image`
	pub async fn logo_file(&mut self, layer: &str, image: &Path) -> Result<String> {
		self.send_command(&format!("@{layer} logo-file {}", image.display())).await
	}

	pub async fn logo_x(&mut self, layer: &str, x: i32) -> Result<String> {
		self.send_command(&format!("@{layer} logo-x {x}")).await
	}

	pub async fn logo_y(&mut self, layer: &str, y: i32) -> Result<String> {
		self.send_command(&format!("@{layer} logo-y {y}")).await
	}

	/// Close the telnet session
	pub async fn disconnect(mut self) -> Result<()> {
		if let Err(e) = self.stream.get_mut().write_all(b"logout\n").await {
			warn!("Failed to send logout: {}", e);
		}
		self.stream.get_mut().shutdown().await?;
		Ok(())
	}

	async fn login(&mut self, password: &str) -> Result<()> {
		let (_, greeting) = self.read_until_any(&[PASSWORD_PROMPT]).await?;
		self.server_version = parse_banner(&greeting).ok_or_else(|| ConnectionError::Banner(greeting.clone()))?;

		let mut payload = password.as_bytes().to_vec();
		payload.push(b'\n');
		let timeout = self.timeout;
		with_timeout(timeout, "sending the password", self.stream.get_mut().write_all(&payload)).await??;

		match self.read_until_any(&[PASSWORD_PROMPT, COMMAND_PROMPT]).await? {
			(0, _) => Err(ConnectionError::WrongPassword),
			_ => Ok(()),
		}
	}

	fn require_version(&self, command: &str, major: u32) -> Result<()> {
		let server_major = self.server_version.split('.').next().and_then(|m| m.parse::<u32>().ok()).unwrap_or(0);
		if server_major < major {
			return Err(ConnectionError::OldServerVersion {
				command: command.to_string(),
				required: major,
				server: self.server_version.clone(),
			});
		}
		Ok(())
	}

	/// Read payload bytes until one of `markers` ends the buffer.
	///
	/// Returns the index of the marker that matched and the text before it, trimmed.
	async fn read_until_any(&mut self, markers: &[&[u8]]) -> Result<(usize, String)> {
		let timeout = self.timeout;
		let Self { stream, filter, .. } = self;
		let read = async {
			let mut data = Vec::new();
			loop {
				let byte = match stream.read_u8().await {
					Ok(byte) => byte,
					Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(ConnectionError::Closed),
					Err(e) => return Err(ConnectionError::Io(e)),
				};
				let Some(byte) = filter.push(byte) else { continue };
				data.push(byte);

				if let Some(idx) = markers.iter().position(|m| data.ends_with(m)) {
					data.truncate(data.len() - markers[idx].len());
					return Ok((idx, String::from_utf8_lossy(&data).trim().to_string()));
				}
			}
		};
		with_timeout(timeout, "waiting for a reply", read).await?
	}
}

async fn with_timeout<F: Future>(timeout: Duration, operation: &'static str, future: F) -> Result<F::Output> {
	tokio::time::timeout(timeout, future).await.map_err(|_| ConnectionError::Timeout { operation, timeout })
}

/// Extract the version from a greeting such as `VLC media player 3.0.20 Vetinari`
fn parse_banner(greeting: &str) -> Option<String> {
	let rest = &greeting[greeting.find(BANNER_PREFIX)? + BANNER_PREFIX.len()..];
	let version: String = rest.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
	(!version.is_empty()).then_some(version)
}

/// `get_time` replies with whole seconds, though some builds report fractions
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_seconds(reply: &str) -> Option<u64> {
	let reply = reply.trim();
	if reply.is_empty() {
		return Some(0);
	}
	if let Ok(secs) = reply.parse::<u64>() {
		return Some(secs);
	}
	match reply.parse::<f64>() {
		Ok(secs) if secs.is_finite() && secs >= 0.0 => Some(secs.trunc() as u64),
		_ => None,
	}
}
