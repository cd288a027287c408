//! Timestamp-indexed cue timelines kept in sync with hand-editable timing files.
//!
//! A [`CueTimeline`] maps playback offsets to cues (slide images, camera channels)
//! and decides which overlay should be on screen for a given playback position.

pub mod cue;
pub mod error;
pub mod overlay;
pub mod timecode;
pub mod timeline;

pub use cue::{ChannelCodec, ChannelCue, CueCodec, SlideCodec, SlideCue};
pub use error::{LinkError, Result, TimecodeError, TimelineError};
pub use overlay::{EmitGate, Overlay, OverlayLayer, OverlaySink, PlaybackClock, RESTART_WINDOW_SECS};
pub use timecode::{format_timecode, parse_timecode};
pub use timeline::{CueTimeline, TimelineEntry};

/// Slide image cues
pub type SlideTimeline = CueTimeline<SlideCodec>;

/// Camera channel cues
pub type StreamTimeline = CueTimeline<ChannelCodec>;
