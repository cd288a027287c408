// vlc-telnet Library
//
// Minimal client for VLC's telnet remote-control interface: login, playback
// control, and the logo sub-filter commands used to draw overlays.

mod client;
mod config;
mod error;
mod negotiation;

pub use client::VlcClient;
pub use config::{VlcConfig, DEFAULT_PORT};
pub use error::{ConnectionError, Result};
pub use negotiation::{strip_negotiation, TelnetFilter};
