use async_trait::async_trait;
use cue_timeline::{LinkError, Overlay, OverlaySink, PlaybackClock};
use std::path::Path;
use tracing::info;
use vlc_telnet::VlcClient;

/// Everything the control loop needs from the player
#[async_trait]
pub trait PlayerControl: PlaybackClock + OverlaySink {
	async fn pause(&mut self) -> Result<(), LinkError>;

	async fn resume(&mut self) -> Result<(), LinkError>;
}

/// VLC driven over its telnet interface
pub struct VlcPlayer {
	client: VlcClient,
}

impl VlcPlayer {
	pub fn new(client: VlcClient) -> Self {
		Self { client }
	}

	/// Add `video` to the playlist and start it
	pub async fn load_video(&mut self, video: &Path) -> Result<(), LinkError> {
		info!(video = %video.display(), "Loading video");
		self.client.add(video).await.map_err(LinkError::new)?;
		Ok(())
	}

	pub async fn close(self) -> Result<(), LinkError> {
		self.client.disconnect().await.map_err(LinkError::new)
	}
}

#[async_trait]
impl PlaybackClock for VlcPlayer {
	async fn current_time(&mut self) -> Result<u64, LinkError> {
		self.client.get_time().await.map_err(LinkError::new)
	}
}

#[async_trait]
impl OverlaySink for VlcPlayer {
	async fn apply_overlay(&mut self, overlay: &Overlay) -> Result<(), LinkError> {
		let layer = overlay.layer.as_str();
		self.client.logo_file(layer, &overlay.image).await.map_err(LinkError::new)?;
		if let Some(y) = overlay.y {
			self.client.logo_y(layer, y).await.map_err(LinkError::new)?;
		}
		self.client.logo_x(layer, overlay.x).await.map_err(LinkError::new)?;
		Ok(())
	}
}

#[async_trait]
impl PlayerControl for VlcPlayer {
	async fn pause(&mut self) -> Result<(), LinkError> {
		self.client.pause().await.map_err(LinkError::new)?;
		Ok(())
	}

	async fn resume(&mut self) -> Result<(), LinkError> {
		self.client.play().await.map_err(LinkError::new)?;
		Ok(())
	}
}
