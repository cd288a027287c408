use crate::config::Mode;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, Write};
use std::time::Duration;

/// Operator keypress, independent of the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
	Char(char),
	Enter,
	Backspace,
	Escape,
	Interrupt,
}

impl Key {
	pub fn from_event(event: KeyEvent) -> Option<Self> {
		if event.kind == KeyEventKind::Release {
			return None;
		}
		match event.code {
			KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => Some(Self::Interrupt),
			KeyCode::Char(c) => Some(Self::Char(c)),
			KeyCode::Enter => Some(Self::Enter),
			KeyCode::Backspace => Some(Self::Backspace),
			KeyCode::Esc => Some(Self::Escape),
			_ => None,
		}
	}
}

/// Non-blocking source of keypresses, polled once per tick
pub trait KeySource {
	fn poll_key(&mut self) -> io::Result<Option<Key>>;
}

/// Reads keys from the controlling terminal
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
	fn poll_key(&mut self) -> io::Result<Option<Key>> {
		while event::poll(Duration::ZERO)? {
			if let Event::Key(key) = event::read()? {
				if let Some(key) = Key::from_event(key) {
					return Ok(Some(key));
				}
			}
		}
		Ok(None)
	}
}

/// Keeps the terminal in raw mode for its lifetime
pub struct RawModeGuard;

impl RawModeGuard {
	pub fn enable() -> io::Result<Self> {
		terminal::enable_raw_mode()?;
		Ok(Self)
	}
}

impl Drop for RawModeGuard {
	fn drop(&mut self) {
		let _ = terminal::disable_raw_mode();
	}
}

/// Writer that emits `\r\n` line endings so output stays aligned in raw mode
pub struct CrlfWriter<W: Write> {
	inner: W,
}

impl<W: Write> CrlfWriter<W> {
	pub fn new(inner: W) -> Self {
		Self { inner }
	}
}

impl<W: Write> Write for CrlfWriter<W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		for (idx, chunk) in buf.split(|&b| b == b'\n').enumerate() {
			if idx > 0 {
				self.inner.write_all(b"\r\n")?;
			}
			self.inner.write_all(chunk)?;
		}
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		self.inner.flush()
	}
}

/// Operator-facing output
pub struct Console<W: Write> {
	out: W,
}

impl<W: Write> Console<W> {
	pub fn new(out: W) -> Self {
		Self { out }
	}

	pub fn line(&mut self, text: &str) -> io::Result<()> {
		write!(self.out, "{text}\r\n")?;
		self.out.flush()
	}

	/// Text left open on the current line for the operator to continue
	pub fn prompt(&mut self, text: &str) -> io::Result<()> {
		write!(self.out, "{text}")?;
		self.out.flush()
	}

	pub fn echo(&mut self, c: char) -> io::Result<()> {
		write!(self.out, "{c}")?;
		self.out.flush()
	}

	/// Remove the last echoed character
	pub fn erase(&mut self) -> io::Result<()> {
		self.prompt("\u{8} \u{8}")
	}

	pub fn banner(&mut self, mode: Mode) -> io::Result<()> {
		let (title, hint) = match mode {
			Mode::Slides => ("Slide syncing", "Start selecting a slide by pressing a number key"),
			Mode::Stream => ("Camera selector", "Select left/right by pressing 1 or 2"),
		};
		let width = hint.len().max(title.len()) + 4;
		let border = "*".repeat(width);
		self.line("")?;
		self.line(&border)?;
		self.line(&format!("* {title:<inner$} *", inner = width - 4))?;
		self.line(&format!("* {hint:<inner$} *", inner = width - 4))?;
		self.line(&format!("* {:<inner$} *", "Ctrl-C to quit", inner = width - 4))?;
		self.line(&border)
	}

	pub fn output(&self) -> &W {
		&self.out
	}
}
