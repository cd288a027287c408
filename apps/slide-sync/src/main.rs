use clap::Parser;
use cue_timeline::{SlideTimeline, StreamTimeline};
use slide_sync::{launcher, Config, Console, CrlfWriter, Project, RawModeGuard, Session, TerminalKeys, VlcPlayer};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vlc_telnet::VlcClient;

const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenv::dotenv().ok();

	// Raw mode swallows bare newlines, so log lines go through a CRLF writer
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "slide_sync=info,cue_timeline=info,vlc_telnet=info".into()))
		.with(tracing_subscriber::fmt::layer().with_writer(|| CrlfWriter::new(std::io::stderr())))
		.init();

	let config = Config::parse();
	config.validate()?;

	let project = Project::resolve(&config.project_dir)?;
	tracing::info!(project = %project.name, mode = %config.mode, "Starting slide sync");

	if !config.no_launch {
		launcher::spawn_player(&config.player_command, &config.vlc_password)?;
	}

	let client = VlcClient::connect_with_retry(&config.vlc_config(), config.connect_attempts, CONNECT_RETRY_DELAY).await?;
	let mut player = VlcPlayer::new(client);

	match launcher::find_first_video(&project.video_dir())? {
		Some(video) => player.load_video(&video).await?,
		None => tracing::warn!(dir = %project.video_dir().display(), "No video found, attach one in the player"),
	}

	let slides = SlideTimeline::load_or_init(project.slide_timings(), project.slide_codec())?;
	let streams = StreamTimeline::load_or_init(project.stream_timings(), project.channel_codec(config.indicator.as_deref()))?;

	if let Some(editor) = &config.editor {
		launcher::open_in_editor(editor, &project.timing_files())?;
	}

	let mut console = Console::new(std::io::stdout());
	console.banner(config.mode)?;

	let mut session = Session::new(config.mode, slides, streams, player, console);
	let outcome = {
		let _raw = RawModeGuard::enable()?;
		session.run(config.tick_interval(), &mut TerminalKeys).await
	};

	if let Err(e) = session.into_player().close().await {
		tracing::warn!("Failed to close player link: {e}");
	}
	outcome?;

	tracing::info!("Slide sync stopped");
	Ok(())
}
