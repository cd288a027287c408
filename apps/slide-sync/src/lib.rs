pub mod config;
pub mod console;
pub mod error;
pub mod launcher;
pub mod player;
pub mod session;

pub use config::{Config, Mode, Project};
pub use console::{Console, CrlfWriter, Key, KeySource, RawModeGuard, TerminalKeys};
pub use error::{Error, Result};
pub use player::{PlayerControl, VlcPlayer};
pub use session::{Flow, Session, SessionState};
