use crate::config::Mode;
use crate::console::{Console, Key, KeySource};
use crate::error::Result;
use crate::player::PlayerControl;
use cue_timeline::{format_timecode, ChannelCue, CueCodec, CueTimeline, SlideCue, SlideTimeline, StreamTimeline};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

const NOT_A_NUMBER: &str = "Error... you need to press a number.";

/// Where the control loop is between ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
	Idle,
	/// Player paused at `at` while the operator types the rest of a slide number
	AwaitingSlideNumberContinuation { at: u64, digits: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
	Continue,
	Quit,
}

/// Reports a recurring error once instead of on every tick
#[derive(Debug, Default)]
struct ErrorLatch {
	last: Option<String>,
}

impl ErrorLatch {
	fn raise(&mut self, message: String) -> bool {
		if self.last.as_deref() == Some(message.as_str()) {
			return false;
		}
		self.last = Some(message);
		true
	}

	fn clear(&mut self) {
		self.last = None;
	}
}

/// The interactive control loop: keypresses in, cues recorded, overlays re-applied
pub struct Session<P, W: Write> {
	mode: Mode,
	state: SessionState,
	slides: SlideTimeline,
	streams: StreamTimeline,
	player: P,
	console: Console<W>,
	slide_errors: ErrorLatch,
	stream_errors: ErrorLatch,
}

impl<P: PlayerControl, W: Write> Session<P, W> {
	pub fn new(mode: Mode, slides: SlideTimeline, streams: StreamTimeline, player: P, console: Console<W>) -> Self {
		Self {
			mode,
			state: SessionState::Idle,
			slides,
			streams,
			player,
			console,
			slide_errors: ErrorLatch::default(),
			stream_errors: ErrorLatch::default(),
		}
	}

	pub fn state(&self) -> &SessionState {
		&self.state
	}

	pub fn slides(&self) -> &SlideTimeline {
		&self.slides
	}

	pub fn streams(&self) -> &StreamTimeline {
		&self.streams
	}

	pub fn player(&self) -> &P {
		&self.player
	}

	pub fn console(&self) -> &Console<W> {
		&self.console
	}

	/// Hand the player back, e.g. to close the link on shutdown
	pub fn into_player(self) -> P {
		self.player
	}

	/// Poll `keys` every `tick` until the operator quits or a fatal error occurs
	pub async fn run<K: KeySource>(&mut self, tick: Duration, keys: &mut K) -> Result<()> {
		let mut interval = tokio::time::interval(tick);
		interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

		loop {
			interval.tick().await;
			let key = keys.poll_key()?;
			if self.tick(key).await? == Flow::Quit {
				info!("Operator ended the session");
				return Ok(());
			}
		}
	}

	/// One polling step: sample the clock once, handle `key`, then re-seek the active timelines
	pub async fn tick(&mut self, key: Option<Key>) -> Result<Flow> {
		let now = self.player.current_time().await?;

		if let Some(key) = key {
			if self.handle_key(key, now).await? == Flow::Quit {
				return Ok(Flow::Quit);
			}
		}

		seek(&mut self.slides, now, &mut self.player, &mut self.slide_errors, &mut self.console).await?;
		if self.mode == Mode::Stream {
			seek(&mut self.streams, now, &mut self.player, &mut self.stream_errors, &mut self.console).await?;
		}
		Ok(Flow::Continue)
	}

	async fn handle_key(&mut self, key: Key, now: u64) -> Result<Flow> {
		if key == Key::Interrupt {
			if matches!(self.state, SessionState::AwaitingSlideNumberContinuation { .. }) {
				self.console.line("")?;
				self.player.resume().await?;
				self.state = SessionState::Idle;
			}
			return Ok(Flow::Quit);
		}

		match (self.mode, &self.state) {
			(Mode::Slides, SessionState::Idle) => self.begin_slide_entry(key).await?,
			(Mode::Slides, SessionState::AwaitingSlideNumberContinuation { .. }) => self.continue_slide_entry(key).await?,
			(Mode::Stream, _) => self.select_channel(key, now)?,
		}
		Ok(Flow::Continue)
	}

	async fn begin_slide_entry(&mut self, key: Key) -> Result<()> {
		let first = match key {
			Key::Char(c) if c.is_ascii_digit() => c,
			_ => {
				self.console.line(NOT_A_NUMBER)?;
				return Ok(());
			}
		};

		self.player.pause().await?;
		let at = self.player.current_time().await?;
		self.console.prompt(&format!("For time {} the slide number is?: {first}", format_timecode(at)))?;
		self.state = SessionState::AwaitingSlideNumberContinuation {
			at,
			digits: first.to_string(),
		};
		Ok(())
	}

	async fn continue_slide_entry(&mut self, key: Key) -> Result<()> {
		let SessionState::AwaitingSlideNumberContinuation { at, digits } = &mut self.state else {
			return Ok(());
		};

		match key {
			Key::Char(c) => {
				digits.push(c);
				self.console.echo(c)?;
				return Ok(());
			}
			Key::Backspace => {
				if digits.pop().is_some() {
					self.console.erase()?;
				}
				return Ok(());
			}
			Key::Escape => {
				self.console.line("")?;
				self.console.line("Slide entry cancelled.")?;
			}
			Key::Enter => {
				let (at, digits) = (*at, std::mem::take(digits));
				self.console.line("")?;
				match digits.trim().parse::<u32>() {
					Ok(number) => {
						let cue = SlideCue::numbered(number);
						match self.slides.record(at, cue.clone()) {
							Ok(()) => info!(at = %format_timecode(at), slide = %cue, "Recorded slide"),
							Err(e) if e.is_recoverable() => self.console.line(&format!("Could not record slide: {e}"))?,
							Err(e) => {
								self.state = SessionState::Idle;
								self.player.resume().await?;
								return Err(e.into());
							}
						}
					}
					Err(_) => self.console.line(NOT_A_NUMBER)?,
				}
			}
			Key::Interrupt => return Ok(()),
		}

		self.state = SessionState::Idle;
		self.player.resume().await?;
		Ok(())
	}

	fn select_channel(&mut self, key: Key, now: u64) -> Result<()> {
		let digit = match key {
			Key::Char(c) => c.to_digit(10),
			_ => None,
		};
		let Some(channel) = digit.and_then(|d| u8::try_from(d).ok()) else {
			self.console.line(NOT_A_NUMBER)?;
			return Ok(());
		};

		if !self.streams.codec().is_known(channel) {
			debug!(channel, "Ignoring key for unconfigured channel");
			return Ok(());
		}

		match self.streams.record(now, ChannelCue(channel)) {
			Ok(()) => self.console.line(&format!("Time {} channel: {channel}", format_timecode(now)))?,
			Err(e) if e.is_recoverable() => self.console.line(&format!("Could not record channel: {e}"))?,
			Err(e) => return Err(e.into()),
		}
		Ok(())
	}
}

/// Re-seek one timeline, surfacing fixable timing-file mistakes without stopping the loop
async fn seek<C, P, W>(timeline: &mut CueTimeline<C>, now: u64, player: &mut P, errors: &mut ErrorLatch, console: &mut Console<W>) -> Result<()>
where
	C: CueCodec,
	P: PlayerControl,
	W: Write,
{
	match timeline.seek_and_maybe_emit(now, player).await {
		Ok(_) => {
			errors.clear();
			Ok(())
		}
		Err(e) if e.is_recoverable() => {
			let message = format!("{}: {e}", timeline.path().display());
			if errors.raise(message.clone()) {
				warn!("Timing file needs fixing: {}", message);
				console.line(&message)?;
			}
			Ok(())
		}
		Err(e) => Err(e.into()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use cue_timeline::{ChannelCodec, LinkError, Overlay, OverlayLayer, OverlaySink, PlaybackClock, SlideCodec};
	use std::fs;
	use tempfile::TempDir;

	#[derive(Default)]
	struct FakePlayer {
		time: u64,
		paused: bool,
		pauses: usize,
		resumes: usize,
		applied: Vec<Overlay>,
	}

	#[async_trait]
	impl PlaybackClock for FakePlayer {
		async fn current_time(&mut self) -> std::result::Result<u64, LinkError> {
			Ok(self.time)
		}
	}

	#[async_trait]
	impl OverlaySink for FakePlayer {
		async fn apply_overlay(&mut self, overlay: &Overlay) -> std::result::Result<(), LinkError> {
			self.applied.push(overlay.clone());
			Ok(())
		}
	}

	#[async_trait]
	impl PlayerControl for FakePlayer {
		async fn pause(&mut self) -> std::result::Result<(), LinkError> {
			self.paused = true;
			self.pauses += 1;
			Ok(())
		}

		async fn resume(&mut self) -> std::result::Result<(), LinkError> {
			self.paused = false;
			self.resumes += 1;
			Ok(())
		}
	}

	struct Keys(Vec<Key>);

	impl KeySource for Keys {
		fn poll_key(&mut self) -> std::io::Result<Option<Key>> {
			Ok((!self.0.is_empty()).then(|| self.0.remove(0)))
		}
	}

	fn session(dir: &TempDir, mode: Mode, time: u64) -> Session<FakePlayer, Vec<u8>> {
		let slides = SlideTimeline::load_or_init(dir.path().join("slide_timings--talk.txt"), SlideCodec::new("slides")).unwrap();
		let streams = StreamTimeline::load_or_init(dir.path().join("streams_timings--talk.txt"), ChannelCodec::new("rec.png")).unwrap();
		let player = FakePlayer { time, ..Default::default() };
		Session::new(mode, slides, streams, player, Console::new(Vec::new()))
	}

	fn output(session: &Session<FakePlayer, Vec<u8>>) -> String {
		String::from_utf8(session.console().output().clone()).unwrap()
	}

	async fn press(session: &mut Session<FakePlayer, Vec<u8>>, keys: &[Key]) {
		for key in keys {
			assert_eq!(session.tick(Some(*key)).await.unwrap(), Flow::Continue);
		}
	}

	#[tokio::test]
	async fn slide_number_entry_pauses_records_and_resumes() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Slides, 95);

		press(&mut session, &[Key::Char('1')]).await;
		assert!(session.player().paused);
		assert_eq!(
			session.state(),
			&SessionState::AwaitingSlideNumberContinuation { at: 95, digits: "1".to_string() }
		);

		press(&mut session, &[Key::Char('2'), Key::Enter]).await;
		assert_eq!(session.state(), &SessionState::Idle);
		assert_eq!((session.player().pauses, session.player().resumes), (1, 1));

		let on_disk = fs::read_to_string(session.slides().path()).unwrap();
		assert_eq!(on_disk, "0:00:00->000.png\n0:01:35->012.png");
		assert!(output(&session).contains("For time 0:01:35 the slide number is?: 12"));

		// The new slide went on screen in the same tick it was recorded
		session.tick(None).await.unwrap();
		let last = session.player().applied.last().unwrap();
		assert_eq!((last.layer, last.image.as_path()), (OverlayLayer::Slides, std::path::Path::new("slides/012.png")));
	}

	#[tokio::test]
	async fn backspace_edits_the_pending_number() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Slides, 10);

		press(&mut session, &[Key::Char('4'), Key::Char('9'), Key::Backspace, Key::Char('2'), Key::Enter]).await;
		assert_eq!(session.slides().entries().last().unwrap().cue, SlideCue::numbered(42));
	}

	#[tokio::test]
	async fn bad_slide_number_is_discarded_and_playback_resumes() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Slides, 10);

		press(&mut session, &[Key::Char('3'), Key::Char('x'), Key::Enter]).await;
		assert_eq!(session.state(), &SessionState::Idle);
		assert_eq!(session.player().resumes, 1);
		assert_eq!(session.slides().entries().len(), 1);
		assert!(output(&session).contains(NOT_A_NUMBER));
	}

	#[tokio::test]
	async fn escape_cancels_slide_entry() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Slides, 10);

		press(&mut session, &[Key::Char('7'), Key::Escape]).await;
		assert_eq!(session.state(), &SessionState::Idle);
		assert!(!session.player().paused);
		assert_eq!(session.slides().entries().len(), 1);
	}

	#[tokio::test]
	async fn non_digit_in_idle_does_not_pause() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Slides, 10);

		press(&mut session, &[Key::Char('q'), Key::Enter]).await;
		assert_eq!(session.player().pauses, 0);
		assert_eq!(output(&session).matches(NOT_A_NUMBER).count(), 2);
	}

	#[tokio::test]
	async fn interrupt_during_entry_resumes_before_quitting() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Slides, 10);

		press(&mut session, &[Key::Char('5')]).await;
		assert_eq!(session.tick(Some(Key::Interrupt)).await.unwrap(), Flow::Quit);
		assert!(!session.player().paused);
		assert_eq!(session.slides().entries().len(), 1);
	}

	#[tokio::test]
	async fn stream_keys_record_known_channels_only() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Stream, 30);

		press(&mut session, &[Key::Char('2')]).await;
		session.player.time = 60;
		press(&mut session, &[Key::Char('3'), Key::Char('1'), Key::Char('x')]).await;

		let on_disk = fs::read_to_string(session.streams().path()).unwrap();
		assert_eq!(on_disk, "0:00:00->1\n0:00:30->2\n0:01:00->1");
		assert_eq!(session.player().pauses, 0);
		let text = output(&session);
		assert!(text.contains("Time 0:00:30 channel: 2"));
		assert!(!text.contains("channel: 3"));
		assert!(text.contains(NOT_A_NUMBER));
	}

	#[tokio::test]
	async fn stream_mode_drives_both_overlay_layers() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Stream, 30);

		session.tick(None).await.unwrap();
		let layers: Vec<_> = session.player().applied.iter().map(|o| o.layer).collect();
		assert_eq!(layers, [OverlayLayer::Slides, OverlayLayer::Recording]);
	}

	#[tokio::test]
	async fn unchanged_cue_is_applied_once() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Slides, 30);

		for _ in 0..5 {
			session.tick(None).await.unwrap();
		}
		assert_eq!(session.player().applied.len(), 1);
	}

	#[tokio::test]
	async fn malformed_timing_file_is_reported_once_and_the_loop_continues() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Slides, 30);
		session.tick(None).await.unwrap();

		fs::write(session.slides().path(), "0:00:00->000.png\nbroken").unwrap();
		for _ in 0..3 {
			assert_eq!(session.tick(None).await.unwrap(), Flow::Continue);
		}
		assert_eq!(output(&session).matches("line 2").count(), 1);

		fs::write(session.slides().path(), "0:00:00->000.png\n0:00:20->003.png").unwrap();
		session.tick(None).await.unwrap();
		assert_eq!(session.player().applied.last().unwrap().image, std::path::Path::new("slides/003.png"));
	}

	#[tokio::test]
	async fn run_stops_on_interrupt() {
		let dir = TempDir::new().unwrap();
		let mut session = session(&dir, Mode::Slides, 0);
		let mut keys = Keys(vec![Key::Char('1'), Key::Char('0'), Key::Enter, Key::Interrupt]);

		session.run(Duration::from_millis(1), &mut keys).await.unwrap();
		assert_eq!(session.slides().entries().last().unwrap().cue, SlideCue::numbered(10));
		assert!(!session.player().paused);
	}
}
