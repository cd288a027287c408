use crate::error::{Result, TimelineError};
use crate::overlay::{Overlay, OverlayLayer};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::PathBuf;

/// Describes how one category of cue is written to its timing file and rendered.
pub trait CueCodec {
	type Cue: Clone + PartialEq + Debug + Send;

	/// Token written after `->` in the timing file
	fn encode(&self, cue: &Self::Cue) -> String;

	fn decode(&self, token: &str) -> Result<Self::Cue>;

	/// Cue seeded at time zero when a timing file is first created
	fn default_cue(&self) -> Self::Cue;

	fn overlay(&self, cue: &Self::Cue) -> Result<Overlay>;
}

/// A slide image file name, e.g. `007.png`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlideCue(String);

impl SlideCue {
	pub fn numbered(number: u32) -> Self {
		Self(format!("{number:03}.png"))
	}

	pub fn file_name(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for SlideCue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Debug, Clone)]
pub struct SlideCodec {
	pub slides_dir: PathBuf,
	pub x: i32,
	pub y: i32,
}

impl SlideCodec {
	pub fn new(slides_dir: impl Into<PathBuf>) -> Self {
		Self {
			slides_dir: slides_dir.into(),
			x: 0,
			y: 15,
		}
	}
}

impl CueCodec for SlideCodec {
	type Cue = SlideCue;

	fn encode(&self, cue: &SlideCue) -> String {
		cue.0.clone()
	}

	fn decode(&self, token: &str) -> Result<SlideCue> {
		let token = token.trim();
		if token.is_empty() {
			return Err(TimelineError::InvalidCue {
				token: token.to_string(),
				reason: "missing slide file name".to_string(),
			});
		}
		if token.chars().any(char::is_whitespace) {
			return Err(TimelineError::InvalidCue {
				token: token.to_string(),
				reason: "slide file name contains whitespace".to_string(),
			});
		}
		Ok(SlideCue(token.to_string()))
	}

	fn default_cue(&self) -> SlideCue {
		SlideCue::numbered(0)
	}

	fn overlay(&self, cue: &SlideCue) -> Result<Overlay> {
		Ok(Overlay {
			layer: OverlayLayer::Slides,
			image: self.slides_dir.join(cue.file_name()),
			x: self.x,
			y: Some(self.y),
		})
	}
}

/// Index of the camera channel being highlighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelCue(pub u8);

impl std::fmt::Display for ChannelCue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

#[derive(Debug, Clone)]
pub struct ChannelCodec {
	pub indicator: PathBuf,
	/// Horizontal indicator position for each known channel
	pub positions: BTreeMap<u8, i32>,
}

impl ChannelCodec {
	pub fn new(indicator: impl Into<PathBuf>) -> Self {
		Self {
			indicator: indicator.into(),
			positions: BTreeMap::from([(1, 200), (2, 950)]),
		}
	}

	pub fn with_position(mut self, channel: u8, x: i32) -> Self {
		self.positions.insert(channel, x);
		self
	}

	pub fn is_known(&self, channel: u8) -> bool {
		self.positions.contains_key(&channel)
	}
}

impl CueCodec for ChannelCodec {
	type Cue = ChannelCue;

	fn encode(&self, cue: &ChannelCue) -> String {
		cue.0.to_string()
	}

	fn decode(&self, token: &str) -> Result<ChannelCue> {
		let token = token.trim();
		token.parse::<u8>().map(ChannelCue).map_err(|e| TimelineError::InvalidCue {
			token: token.to_string(),
			reason: e.to_string(),
		})
	}

	fn default_cue(&self) -> ChannelCue {
		ChannelCue(1)
	}

	fn overlay(&self, cue: &ChannelCue) -> Result<Overlay> {
		let x = self.positions.get(&cue.0).copied().ok_or(TimelineError::UnknownChannel(cue.0))?;
		Ok(Overlay {
			layer: OverlayLayer::Recording,
			image: self.indicator.clone(),
			x,
			y: None,
		})
	}
}
