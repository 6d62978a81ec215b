mod player;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::*;
use futures::future::join_all;
use tandem_client::{
    CallSession, ClientConfig, LocalPlayer, MemoryPlaybackStore, MemorySignalingStore, MeshContext,
    MeshObserver, PlaybackHandle, PlaybackSyncEngine, RemoteStream, SyntheticCapture,
    SystemClock, WebRtcTransportFactory, spawn_sample_pump,
};
use tandem_core::{PeerId, RoomId};
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::player::SimulatedPlayer;

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "Group watch over a WebRTC mesh")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs a room of in-process participants over loopback connections.
    Simulate {
        #[arg(short, long, default_value_t = 3)]
        peers: usize,

        #[arg(short, long, default_value_t = 12)]
        seconds: u64,

        #[arg(long, default_value = "movie-night")]
        room: String,

        /// JSON client configuration.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Prints mesh events as they reach one participant.
struct PrintingObserver {
    name: String,
}

#[async_trait]
impl MeshObserver for PrintingObserver {
    async fn on_remote_stream(&self, _ctx: &MeshContext, peer_id: PeerId, stream: RemoteStream) {
        let kinds: Vec<String> = stream.tracks.iter().map(|t| t.kind.to_string()).collect();
        println!(
            "   {} {} receives {} from {}",
            "+".green(),
            self.name.bold(),
            kinds.join("+"),
            peer_id
        );
    }

    async fn on_peer_disconnected(&self, _ctx: &MeshContext, peer_id: PeerId) {
        println!("   {} {} lost {}", "-".red(), self.name.bold(), peer_id);
    }
}

struct Participant {
    name: String,
    session: CallSession,
    player: Arc<SimulatedPlayer>,
    playback: PlaybackHandle,
    engine: JoinHandle<()>,
    pump: Option<JoinHandle<()>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            peers,
            seconds,
            room,
            config,
        } => {
            let config = load_config(config)?;
            simulate(RoomId::from(room), peers.max(2), seconds, config).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<ClientConfig> {
    let Some(path) = path else {
        return Ok(ClientConfig::default());
    };
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    ClientConfig::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
}

async fn simulate(room_id: RoomId, peers: usize, seconds: u64, config: ClientConfig) -> Result<()> {
    println!(
        "{}",
        format!("🎬 Simulating {} participants in room {}", peers, room_id)
            .green()
            .bold()
    );

    info!(
        "Using {} ICE servers, debounce {} ms",
        config.transport.ice_servers.len(),
        config.sync.debounce_ms
    );

    let signaling = Arc::new(MemorySignalingStore::new());
    let playback = Arc::new(MemoryPlaybackStore::new());
    let factory = Arc::new(
        WebRtcTransportFactory::new(config.transport.clone())
            .context("Failed to build the WebRTC API")?,
    );

    let mut participants = Vec::with_capacity(peers);
    for index in 0..peers {
        let name = format!("peer-{}", index + 1);
        let peer_id = PeerId::from(name.as_str());

        let session = CallSession::new(
            room_id.clone(),
            peer_id.clone(),
            config.media,
            signaling.clone(),
            factory.clone(),
            Arc::new(SyntheticCapture::new(name.as_str())),
            Arc::new(PrintingObserver { name: name.clone() }),
        );

        // Every other participant's player runs slightly fast.
        let rate = if index % 2 == 1 { 1.05 } else { 1.0 };
        let player = Arc::new(SimulatedPlayer::new(name.as_str(), rate));
        let (engine, handle) = PlaybackSyncEngine::new(
            room_id.clone(),
            peer_id,
            playback.clone(),
            player.clone(),
            Arc::new(SystemClock),
            config.sync.clone(),
        )
        .await
        .context("Failed to subscribe to playback state")?;

        participants.push(Participant {
            name,
            session,
            player,
            playback: handle,
            engine: tokio::spawn(engine.run()),
            pump: None,
        });
    }

    println!("{}", "📡 Joining...".cyan());
    for participant in &mut participants {
        participant
            .session
            .connect()
            .await
            .with_context(|| format!("{} failed to connect", participant.name))?;
        if let Some(tracks) = participant.session.local_tracks().await {
            participant.pump = Some(spawn_sample_pump(tracks));
        }
    }

    let host = &participants[0];
    host.player.user_action(true, 0.0);
    host.playback.play(0.0).await?;

    for second in 1..=seconds {
        tokio::time::sleep(Duration::from_secs(1)).await;

        if second == seconds / 2 {
            let last = &participants[participants.len() - 1];
            println!("{}", format!("⏩ {} seeks to 120s", last.name).cyan());
            last.player.user_action(true, 120.0);
            last.playback.seek(120.0).await?;
        }
        if second + 2 == seconds {
            let host = &participants[0];
            let current_time = host.player.snapshot().current_time;
            println!("{}", format!("⏸  {} pauses at {:.1}s", host.name, current_time).cyan());
            host.player.user_action(false, current_time);
            host.playback.pause(current_time).await?;
        }

        print_status(second, &participants).await;
    }

    println!("{}", "👋 Leaving...".cyan());
    join_all(participants.into_iter().map(leave)).await;

    println!("{}", "✨ Simulation finished".green().bold());
    Ok(())
}

async fn leave(participant: Participant) {
    participant.playback.stop().await;
    participant.session.disconnect().await;
    let _ = participant.engine.await;
    if let Some(pump) = participant.pump {
        let _ = pump.await;
    }
}

async fn print_status(second: u64, participants: &[Participant]) {
    println!("{}", format!("── t={}s", second).dimmed());
    for participant in participants {
        let connected = match participant.session.mesh().await {
            Some(mesh) => mesh.remote_streams().len(),
            None => 0,
        };
        println!(
            "   {:<8} {} peers  {}",
            participant.name.bold(),
            connected,
            participant.player.status()
        );
    }
}
