//! Telnet option negotiation filtering.
//!
//! VLC's telnet interface emits IAC sequences (most notably `WILL ECHO` /
//! `WONT ECHO` around the password prompt). They carry no payload for us, so
//! they are dropped from the data stream without replying.

const IAC: u8 = 255;
const DONT: u8 = 254;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
	#[default]
	Data,
	Iac,
	OptionCode,
	Subnegotiation,
	SubnegotiationIac,
}

/// Byte-at-a-time filter that strips telnet commands from the stream
#[derive(Debug, Default)]
pub struct TelnetFilter {
	state: State,
}

impl TelnetFilter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Feed one raw byte, returning it if it is payload data
	pub fn push(&mut self, byte: u8) -> Option<u8> {
		match (self.state, byte) {
			(State::Data, IAC) => {
				self.state = State::Iac;
				None
			}
			(State::Data, _) => Some(byte),
			// Escaped 0xFF data byte
			(State::Iac, IAC) => {
				self.state = State::Data;
				Some(IAC)
			}
			(State::Iac, WILL..=DONT) => {
				self.state = State::OptionCode;
				None
			}
			(State::Iac, SB) => {
				self.state = State::Subnegotiation;
				None
			}
			(State::Iac | State::OptionCode, _) => {
				self.state = State::Data;
				None
			}
			(State::Subnegotiation, IAC) => {
				self.state = State::SubnegotiationIac;
				None
			}
			(State::Subnegotiation, _) => None,
			(State::SubnegotiationIac, SE) => {
				self.state = State::Data;
				None
			}
			(State::SubnegotiationIac, _) => {
				self.state = State::Subnegotiation;
				None
			}
		}
	}
}

/// Strip all telnet commands from a complete buffer
pub fn strip_negotiation(raw: &[u8]) -> Vec<u8> {
	let mut filter = TelnetFilter::new();
	raw.iter().filter_map(|&b| filter.push(b)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_text_passes_through() {
		assert_eq!(strip_negotiation(b"Welcome, Master\r\n> "), b"Welcome, Master\r\n> ");
	}

	#[test]
	fn echo_negotiation_around_password_prompt_is_dropped() {
		let raw = b"Password: \xff\xfb\x01\xff\xfc\x01\r\nWelcome, Master\r\n> ";
		assert_eq!(strip_negotiation(raw), b"Password: \r\nWelcome, Master\r\n> ");
	}

	#[test]
	fn escaped_iac_is_kept_as_data() {
		assert_eq!(strip_negotiation(b"a\xff\xffb"), b"a\xffb");
	}

	#[test]
	fn subnegotiation_blocks_are_skipped() {
		assert_eq!(strip_negotiation(b"x\xff\xfa\x18\x01\xff\xf0y"), b"xy");
	}

	#[test]
	fn filter_keeps_state_between_reads() {
		let mut filter = TelnetFilter::new();
		assert_eq!(filter.push(b'>'), Some(b'>'));
		assert_eq!(filter.push(IAC), None);
		assert_eq!(filter.push(WILL), None);
		assert_eq!(filter.push(1), None);
		assert_eq!(filter.push(b' '), Some(b' '));
	}
}
