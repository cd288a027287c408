// Client behaviour against an in-process stand-in for VLC's telnet interface

use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use vlc_telnet::{ConnectionError, VlcClient, VlcConfig};

const SERVER_PASSWORD: &str = "admin";

// ============================================================================
// Test harness
// ============================================================================

/// Accept one connection and answer like VLC 3.0 would, forwarding every command received
async fn spawn_fake_vlc() -> (u16, mpsc::UnboundedReceiver<String>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let port = listener.local_addr().unwrap().port();
	let (tx, rx) = mpsc::unbounded_channel();

	tokio::spawn(async move {
		let (socket, _) = listener.accept().await.unwrap();
		let (read, mut write) = socket.into_split();
		let mut lines = BufReader::new(read).lines();

		write.write_all(b"VLC media player 3.0.20 Vetinari\r\nPassword: \xff\xfb\x01").await.unwrap();
		loop {
			let Ok(Some(line)) = lines.next_line().await else { return };
			if line.trim() == SERVER_PASSWORD {
				write.write_all(b"\xff\xfc\x01\r\nWelcome, Master\r\n> ").await.unwrap();
				break;
			}
			write.write_all(b"\xff\xfc\x01\r\nWrong password\r\nPassword: \xff\xfb\x01").await.unwrap();
		}

		while let Ok(Some(line)) = lines.next_line().await {
			let _ = tx.send(line.clone());
			let reply = match line.as_str() {
				"get_time" => "137\r\n",
				"status" => "( audio volume: 256 )\r\n( state playing )\r\n",
				"logout" | "shutdown" => return,
				_ => "",
			};
			if write.write_all(format!("{reply}> ").as_bytes()).await.is_err() {
				return;
			}
		}
	});

	(port, rx)
}

fn config_for(port: u16, password: &str) -> VlcConfig {
	VlcConfig {
		host: "127.0.0.1".to_string(),
		port,
		password: password.to_string(),
		timeout: Duration::from_secs(2),
	}
}

fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
	let mut received = Vec::new();
	while let Ok(line) = rx.try_recv() {
		received.push(line);
	}
	received
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn logs_in_and_reports_server_version() {
	let (port, _rx) = spawn_fake_vlc().await;
	let client = VlcClient::connect(&config_for(port, SERVER_PASSWORD)).await.unwrap();
	assert_eq!(client.server_version(), "3.0.20");
}

#[tokio::test]
async fn reads_playback_time_and_status() {
	let (port, _rx) = spawn_fake_vlc().await;
	let mut client = VlcClient::connect(&config_for(port, SERVER_PASSWORD)).await.unwrap();

	assert_eq!(client.get_time().await.unwrap(), 137);
	let status = client.status().await.unwrap();
	assert!(status.starts_with("( audio volume"), "got {status:?}");
	assert!(status.ends_with("( state playing )"), "got {status:?}");
	// Prompt residue from the previous reply must not leak into the next one
	assert_eq!(client.get_time().await.unwrap(), 137);
}

#[tokio::test]
async fn pause_forces_play_before_toggling() {
	let (port, mut rx) = spawn_fake_vlc().await;
	let mut client = VlcClient::connect(&config_for(port, SERVER_PASSWORD)).await.unwrap();

	client.pause().await.unwrap();
	client.play().await.unwrap();
	assert_eq!(drain(&mut rx), ["play", "pause", "play"]);
}

#[tokio::test]
async fn overlay_and_playlist_commands_are_formatted_for_the_logo_filter() {
	let (port, mut rx) = spawn_fake_vlc().await;
	let mut client = VlcClient::connect(&config_for(port, SERVER_PASSWORD)).await.unwrap();

	client.logo_file("slides", Path::new("/talk/slides/004.png")).await.unwrap();
	client.logo_y("slides", 15).await.unwrap();
	client.logo_x("recording", 950).await.unwrap();
	client.add(Path::new("/talk/video/main.mp4")).await.unwrap();
	client.seek(42).await.unwrap();

	assert_eq!(
		drain(&mut rx),
		[
			"@slides logo-file /talk/slides/004.png",
			"@slides logo-y 15",
			"@recording logo-x 950",
			"add /talk/video/main.mp4",
			"seek 42",
		]
	);
}

#[tokio::test]
async fn playlist_can_be_queued_and_stopped() {
	let (port, mut rx) = spawn_fake_vlc().await;
	let mut client = VlcClient::connect(&config_for(port, SERVER_PASSWORD)).await.unwrap();

	client.enqueue(Path::new("/talk/video/outro.mkv")).await.unwrap();
	client.play().await.unwrap();
	client.stop().await.unwrap();
	assert_eq!(drain(&mut rx), ["enqueue /talk/video/outro.mkv", "play", "stop"]);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
	let (port, _rx) = spawn_fake_vlc().await;
	let err = VlcClient::connect(&config_for(port, "hunter2")).await.err().unwrap();
	assert!(matches!(err, ConnectionError::WrongPassword), "got {err:?}");
}

#[tokio::test]
async fn closed_connection_is_reported() {
	let (port, _rx) = spawn_fake_vlc().await;
	let mut client = VlcClient::connect(&config_for(port, SERVER_PASSWORD)).await.unwrap();

	let err = client.send_command("shutdown").await.unwrap_err();
	assert!(matches!(err, ConnectionError::Closed), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_is_retried_then_surfaced() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let port = listener.local_addr().unwrap().port();
	drop(listener);

	let config = config_for(port, SERVER_PASSWORD);
	let err = VlcClient::connect_with_retry(&config, 3, Duration::from_millis(10)).await.err().unwrap();
	assert!(err.is_not_ready(), "got {err:?}");
}

#[tokio::test]
async fn disconnect_sends_logout() {
	let (port, mut rx) = spawn_fake_vlc().await;
	let client = VlcClient::connect(&config_for(port, SERVER_PASSWORD)).await.unwrap();
	client.disconnect().await.unwrap();

	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(drain(&mut rx), ["logout"]);
}
