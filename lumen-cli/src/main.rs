use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::*;
use lumen_client::{
    NegotiationError, PeerSessionManager, RemoteTrack, RtcTransportFactory, SampleTrackCapture,
    SessionObserver, SessionParts, connect_relay,
};
use lumen_core::{ParticipantId, Role, RoomId};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen", version, about = "Watch or broadcast a Lumen room")]
struct Cli {
    /// Relay WebSocket URL.
    #[arg(long, env = "LUMEN_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Room to join; a fresh one is generated when omitted.
    #[arg(long, env = "LUMEN_ROOM")]
    room: Option<String>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long = "log", env = "LUMEN_LOG", default_value = "warn")]
    log_filter: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Receive the room's broadcast.
    Watch,

    /// Offer local tracks to every viewer in the room.
    Broadcast {
        #[arg(long)]
        no_video: bool,

        #[arg(long)]
        no_audio: bool,
    },
}

struct ConsoleObserver;

#[async_trait]
impl SessionObserver for ConsoleObserver {
    async fn on_joined(&self, room_id: RoomId, local: ParticipantId) {
        println!(
            "{} {} {}",
            "✔ Joined".green().bold(),
            room_id.as_str().cyan(),
            format!("as {}", local).dimmed()
        );
    }

    async fn on_stream_attached(&self, remote: ParticipantId, track: RemoteTrack) {
        println!(
            "{} {} track from {}",
            "▶".cyan(),
            track.kind.bold(),
            remote
        );
    }

    async fn on_peer_connected(&self, remote: ParticipantId) {
        println!("{} {}", "⇄ Connected to".green(), remote);
    }

    async fn on_peer_closed(&self, remote: ParticipantId) {
        println!("{} {}", "✕ Link closed:".yellow(), remote);
    }

    async fn on_negotiation_aborted(&self, remote: ParticipantId, error: &NegotiationError) {
        eprintln!("{} {}: {}", "✖ Negotiation aborted with".red().bold(), remote, error);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_filter)),
        )
        .init();

    let (role, capture) = match cli.command {
        Commands::Watch => (Role::Viewer, SampleTrackCapture::default()),
        Commands::Broadcast { no_video, no_audio } => (
            Role::Broadcaster,
            SampleTrackCapture {
                video: !no_video,
                audio: !no_audio,
            },
        ),
    };
    let room_id = cli.room.map(RoomId::from).unwrap_or_else(RoomId::generate);

    println!(
        "{} {} {}",
        "🚀 Lumen".green().bold(),
        role.to_string().bold(),
        format!("via {}", cli.url).dimmed()
    );

    let (signals, incoming) = connect_relay(&cli.url)
        .await
        .context("Relay is not reachable")?;

    let manager = Arc::new(PeerSessionManager::new(
        role,
        Vec::new(),
        SessionParts {
            signals: Arc::new(signals),
            observer: Arc::new(ConsoleObserver),
            factory: Arc::new(RtcTransportFactory),
            capture: Arc::new(capture),
        },
    ));

    let mut session = tokio::spawn({
        let manager = manager.clone();
        async move { manager.run(incoming).await }
    });

    manager.join_room(room_id.clone()).await;
    println!("{} {}", "📂 Room:".cyan(), room_id.as_str().bold());

    tokio::select! {
        _ = &mut session => {
            println!("{}", "Relay connection closed".yellow());
        }
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for ctrl-c")?;
            manager.teardown_all().await;
            println!("{}", "✨ Stopped, all peer connections closed".green().bold());
        }
    }

    Ok(())
}
