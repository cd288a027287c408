use crate::error::LinkError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Playback position at or below which a seek always reasserts the overlay
pub const RESTART_WINDOW_SECS: u64 = 2;

/// Named overlay layers rendered on top of the video by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayLayer {
	Slides,
	Recording,
}

impl OverlayLayer {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Slides => "slides",
			Self::Recording => "recording",
		}
	}

	#[must_use]
	pub const fn all() -> [Self; 2] {
		[Self::Recording, Self::Slides]
	}
}

impl std::fmt::Display for OverlayLayer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// A fully resolved "show this image here" instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
	pub layer: OverlayLayer,
	pub image: PathBuf,
	pub x: i32,
	/// Left untouched when `None`
	pub y: Option<i32>,
}

/// Source of the current playback position
#[async_trait]
pub trait PlaybackClock: Send {
	/// Elapsed playback time in whole seconds, truncated toward zero
	async fn current_time(&mut self) -> Result<u64, LinkError>;
}

/// Something that can render an overlay on the running player
#[async_trait]
pub trait OverlaySink: Send {
	async fn apply_overlay(&mut self, overlay: &Overlay) -> Result<(), LinkError>;
}

/// Remembers the last emitted cue so unchanged cues are not re-sent every tick
#[derive(Debug, Clone)]
pub struct EmitGate<V> {
	last: Option<V>,
}

impl<V: PartialEq + Clone> EmitGate<V> {
	#[must_use]
	pub const fn new() -> Self {
		Self { last: None }
	}

	/// A cue is emitted when it differs from the last one, or when playback is
	/// inside the restart window.
	#[must_use]
	pub fn should_emit(&self, cue: &V, now: u64) -> bool {
		now < RESTART_WINDOW_SECS || self.last.as_ref() != Some(cue)
	}

	/// Record a cue that has actually been applied
	pub fn mark_emitted(&mut self, cue: V) {
		self.last = Some(cue);
	}

	#[must_use]
	pub const fn last(&self) -> Option<&V> {
		self.last.as_ref()
	}
}

impl<V: PartialEq + Clone> Default for EmitGate<V> {
	fn default() -> Self {
		Self::new()
	}
}
