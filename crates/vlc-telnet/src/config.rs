use std::time::Duration;

pub const DEFAULT_PORT: u16 = 4212;

#[derive(Debug, Clone)]
pub struct VlcConfig {
	pub host: String,
	pub port: u16,
	pub password: String,
	/// Upper bound for connecting and for each command round trip
	pub timeout: Duration,
}

impl VlcConfig {
	pub fn address(&self) -> String {
		if self.host.contains(':') {
			format!("[{}]:{}", self.host, self.port)
		} else {
			format!("{}:{}", self.host, self.port)
		}
	}
}

impl Default for VlcConfig {
	fn default() -> Self {
		Self {
			host: "::1".to_string(),
			port: DEFAULT_PORT,
			password: "admin".to_string(),
			timeout: Duration::from_secs(5),
		}
	}
}
