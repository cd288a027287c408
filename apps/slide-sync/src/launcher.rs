use crate::error::{Error, Result};
use cue_timeline::OverlayLayer;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::{info, warn};

const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mkv", "avi"];

/// `--sub-filter` chain giving each overlay layer its own logo filter instance
pub fn sub_filter_chain() -> String {
	OverlayLayer::all().iter().map(|layer| format!("logo@{layer}")).collect::<Vec<_>>().join(":")
}

pub fn player_args(password: &str) -> Vec<String> {
	vec![
		"--extraintf".to_string(),
		"telnet".to_string(),
		"--telnet-password".to_string(),
		password.to_string(),
		format!("--sub-filter={}", sub_filter_chain()),
	]
}

/// Start the player with its telnet interface and overlay filters enabled
pub fn spawn_player(program: &str, password: &str) -> Result<Child> {
	info!(program, "Starting player");
	Command::new(program)
		.args(player_args(password))
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.spawn()
		.map_err(|source| Error::Launch {
			program: program.to_string(),
			source,
		})
}

/// First video file in `dir` by name, if any
pub fn find_first_video(dir: &Path) -> Result<Option<PathBuf>> {
	let entries = match fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			warn!(dir = %dir.display(), "No video directory");
			return Ok(None);
		}
		Err(e) => return Err(e.into()),
	};

	let mut videos: Vec<PathBuf> = entries
		.filter_map(|entry| entry.ok().map(|e| e.path()))
		.filter(|path| path.is_file() && is_video(path))
		.collect();
	videos.sort();
	Ok(videos.into_iter().next())
}

fn is_video(path: &Path) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)))
}

/// Open the timing files in a text editor so they can be edited while the player runs.
///
/// The editor processes are left running; their handles are returned.
pub fn open_in_editor(editor: &str, files: &[PathBuf]) -> Result<Vec<Child>> {
	let mut editors = Vec::with_capacity(files.len());
	for file in files {
		let child = Command::new(editor)
			.arg(file)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()
			.map_err(|source| Error::Launch {
				program: editor.to_string(),
				source,
			})?;
		info!(editor, file = %file.display(), "Opened timing file");
		editors.push(child);
	}
	Ok(editors)
}
