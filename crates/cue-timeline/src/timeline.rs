use crate::cue::CueCodec;
use crate::error::{Result, TimelineError};
use crate::overlay::{EmitGate, OverlaySink};
use crate::timecode::{format_timecode, parse_timecode};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SEPARATOR: &str = "->";

/// A cue scheduled at a playback offset in whole seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry<V> {
	pub trigger_time: u64,
	pub cue: V,
}

impl<V> TimelineEntry<V> {
	#[must_use]
	pub const fn new(trigger_time: u64, cue: V) -> Self {
		Self { trigger_time, cue }
	}
}

/// A sorted, file-backed list of cues for one category.
///
/// The backing file is the source of truth: it is re-read before every lookup
/// and record, and any difference from the last seen text triggers a full reparse.
pub struct CueTimeline<C: CueCodec> {
	path: PathBuf,
	codec: C,
	entries: Vec<TimelineEntry<C::Cue>>,
	backing_text: String,
	gate: EmitGate<C::Cue>,
}

impl<C: CueCodec> CueTimeline<C> {
	/// Open the timing file at `path`, creating it with a single default entry if it is absent.
	///
	/// # Errors
	///
	/// A file that exists but cannot be read or parsed is an error; it is never overwritten.
	pub fn load_or_init(path: impl Into<PathBuf>, codec: C) -> Result<Self> {
		let path = path.into();
		let text = match fs::read_to_string(&path) {
			Ok(text) => text,
			Err(e) if e.kind() == ErrorKind::NotFound => {
				let default = serialize_entries(&codec, &[TimelineEntry::new(0, codec.default_cue())]);
				fs::write(&path, &default).map_err(|e| TimelineError::io(&path, e))?;
				info!(path = %path.display(), "Created timing file with default cue");
				default
			}
			Err(e) => return Err(TimelineError::io(&path, e)),
		};

		let entries = parse_entries(&codec, &text)?;
		debug!(path = %path.display(), entries = entries.len(), "Loaded timing file");

		Ok(Self {
			path,
			codec,
			entries,
			backing_text: text,
			gate: EmitGate::new(),
		})
	}

	/// Re-read the backing file, reparsing it if its content changed since the last read or write.
	///
	/// Returns whether the in-memory entries were replaced.
	///
	/// # Errors
	///
	/// An unreadable file is [`TimelineError::Io`]. A malformed or empty one is a recoverable
	/// parse error that leaves the entries untouched.
	pub fn refresh(&mut self) -> Result<bool> {
		let text = fs::read_to_string(&self.path).map_err(|e| TimelineError::io(&self.path, e))?;
		if text == self.backing_text {
			return Ok(false);
		}

		let entries = parse_entries(&self.codec, &text)?;
		info!(path = %self.path.display(), entries = entries.len(), "Timing file changed, reloaded");
		self.entries = entries;
		self.backing_text = text;
		Ok(true)
	}

	/// Insert a cue at `trigger_time` and rewrite the whole backing file.
	///
	/// External edits are picked up first so they are not clobbered. On equal
	/// trigger times the new entry lands after the existing ones.
	///
	/// # Errors
	///
	/// Fails without touching the file or the entries if the refresh or the write fails.
	pub fn record(&mut self, trigger_time: u64, cue: C::Cue) -> Result<()> {
		self.refresh()?;

		let mut entries = self.entries.clone();
		entries.push(TimelineEntry::new(trigger_time, cue));
		entries.sort_by_key(|entry| entry.trigger_time);

		let text = serialize_entries(&self.codec, &entries);
		fs::write(&self.path, &text).map_err(|e| TimelineError::io(&self.path, e))?;
		self.entries = entries;
		self.backing_text = text;

		debug!(path = %self.path.display(), at = trigger_time, "Recorded cue");
		Ok(())
	}

	/// The cue in effect at `now`: the last entry at or before `now`, clamped to the first entry.
	///
	/// # Errors
	///
	/// [`TimelineError::EmptyTimeline`] if there are no entries.
	pub fn resolve_active(&self, now: u64) -> Result<&C::Cue> {
		let first = self.entries.first().ok_or(TimelineError::EmptyTimeline)?;
		// Entries are sorted, so everything before the partition point triggers at or before `now`
		let started = self.entries.partition_point(|entry| entry.trigger_time <= now);
		let entry = started.checked_sub(1).map_or(first, |idx| &self.entries[idx]);
		Ok(&entry.cue)
	}

	/// Refresh, resolve the cue for `now` and apply it through `sink` unless it was already applied.
	///
	/// Returns whether an overlay was emitted. A recoverable refresh error does not
	/// stop the seek: the kept entries are still resolved and emitted, then the error is returned.
	///
	/// # Errors
	///
	/// Returns the refresh error, a codec error for a cue that cannot be rendered, or the sink's [`LinkError`](crate::LinkError).
	pub async fn seek_and_maybe_emit<S>(&mut self, now: u64, sink: &mut S) -> Result<bool>
	where
		S: OverlaySink + ?Sized,
	{
		let stale = match self.refresh() {
			Ok(_) => None,
			Err(e) if e.is_recoverable() => Some(e),
			Err(e) => return Err(e),
		};

		let emitted = self.emit_active(now, sink).await?;
		stale.map_or(Ok(emitted), Err)
	}

	async fn emit_active<S>(&mut self, now: u64, sink: &mut S) -> Result<bool>
	where
		S: OverlaySink + ?Sized,
	{
		let cue = self.resolve_active(now)?.clone();
		if !self.gate.should_emit(&cue, now) {
			return Ok(false);
		}

		let overlay = self.codec.overlay(&cue)?;
		if let Err(e) = sink.apply_overlay(&overlay).await {
			warn!(layer = %overlay.layer, "Failed to apply overlay");
			return Err(e.into());
		}
		debug!(layer = %overlay.layer, image = %overlay.image.display(), at = now, "Applied overlay");
		self.gate.mark_emitted(cue);
		Ok(true)
	}

	#[must_use]
	pub fn entries(&self) -> &[TimelineEntry<C::Cue>] {
		&self.entries
	}

	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}

	#[must_use]
	pub const fn codec(&self) -> &C {
		&self.codec
	}

	/// Last cue actually handed to an overlay sink
	#[must_use]
	pub const fn last_resolved(&self) -> Option<&C::Cue> {
		self.gate.last()
	}
}

fn parse_entries<C: CueCodec>(codec: &C, text: &str) -> Result<Vec<TimelineEntry<C::Cue>>> {
	let mut entries = Vec::new();
	for (idx, raw) in text.split('\n').enumerate() {
		let line = raw.trim();
		if line.is_empty() {
			continue;
		}
		entries.push(parse_line(codec, line).map_err(|reason| TimelineError::Parse { line: idx + 1, reason })?);
	}
	if entries.is_empty() {
		return Err(TimelineError::NoCues);
	}
	entries.sort_by_key(|entry| entry.trigger_time);
	Ok(entries)
}

fn parse_line<C: CueCodec>(codec: &C, line: &str) -> std::result::Result<TimelineEntry<C::Cue>, String> {
	let (time, token) = line.split_once(SEPARATOR).ok_or_else(|| format!("expected '<timecode>{SEPARATOR}<cue>', got '{line}'"))?;
	let trigger_time = parse_timecode(time).map_err(|e| e.to_string())?;
	let cue = codec.decode(token).map_err(|e| e.to_string())?;
	Ok(TimelineEntry::new(trigger_time, cue))
}

fn serialize_entries<C: CueCodec>(codec: &C, entries: &[TimelineEntry<C::Cue>]) -> String {
	entries
		.iter()
		.map(|entry| format!("{}{SEPARATOR}{}", format_timecode(entry.trigger_time), codec.encode(&entry.cue)))
		.collect::<Vec<_>>()
		.join("\n")
}
