use std::{any::Any, path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use tale_audio_core::{
    AppConfig, AudioBackend, AudioConfig, AudioError, AudioService, BgmTrack, ContextThread,
    Dispatch, Gate, LogBackend, ResourceKey, Sfx,
};
use tracing_subscriber::EnvFilter;

mod transcript;

use transcript::Transcript;

fn main() -> tale_audio_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    cli.apply_overrides(&mut config.audio);

    let context = ContextThread::spawn("audio-context")?;
    let gate = Gate::new(context.clone());
    let (backend, _output) = open_backend(cli.headless);
    let audio = Arc::new(AudioService::new(&config.audio, gate.clone(), backend));
    {
        let audio = Arc::clone(&audio);
        gate.run_and_wait(move || audio.init())?;
    }

    let transcript = Transcript::new(gate.clone());
    run_command(&cli.command, &audio, &transcript);

    if let Some(hold) = hold_duration(cli.hold) {
        std::thread::sleep(hold);
    }
    gate.run_and_wait(|| ())?;
    let status = serde_json::to_string_pretty(&audio.status())
        .map_err(|err| AudioError::msg(format!("failed to encode status: {err}")))?;
    println!("{status}");

    audio.shutdown();
    context.shutdown();
    Ok(())
}

fn run_command(command: &Commands, audio: &AudioService, transcript: &Transcript) {
    match command {
        Commands::Idle { chapter } => report("idle", audio.play_idle_for(*chapter)),
        Commands::Battle {
            chapter,
            enemy,
            boss,
        } => report(
            "battle",
            audio.play_battle_for(*chapter, enemy.as_deref(), *boss),
        ),
        Commands::Track { track } => report("track", audio.play_bgm((*track).into())),
        Commands::Base { key } => report("base", audio.play_bgm_base(key.as_str())),
        Commands::Sfx { effect } => report("sfx", audio.play_sfx((*effect).into())),
        Commands::Stop => report("stop", audio.stop_bgm()),
        Commands::Resolve { key } => match audio.resolver().resolve(&ResourceKey::new(key)) {
            Some(resource) => println!("{key} -> {}", resource.locator.display()),
            None => println!("{key} -> not found"),
        },
        Commands::Demo => run_demo(audio, transcript),
    }
}

fn run_demo(audio: &AudioService, transcript: &Transcript) {
    transcript.write("Chapter 1: the village is quiet.");
    report("idle", audio.play_idle_for(1));

    for round in 1..=3 {
        transcript.clear();
        transcript.write(format!("Ambush #{round}!"));
        report("battle", audio.play_battle_for(1, Some("Bandit"), false));
        report("sfx", audio.play_sfx(Sfx::Hit));
    }

    transcript.clear();
    transcript.write("Chapter 3: the Iron Golem awakens.");
    report("boss", audio.play_battle_for(3, Some("Iron Golem"), true));
    report("sfx", audio.play_sfx(Sfx::Hit));

    transcript.clear();
    transcript.write("Victory.");
    report("stop", audio.stop_bgm());
}

/// How long to keep the process alive; `None` for zero or unusable values.
fn hold_duration(seconds: f32) -> Option<Duration> {
    match Duration::try_from_secs_f32(seconds) {
        Ok(hold) if !hold.is_zero() => Some(hold),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!(seconds, %err, "ignoring --hold");
            None
        }
    }
}

fn report(request: &str, dispatch: Dispatch) {
    tracing::info!(request, ?dispatch, "audio request");
}

/// Returns the backend plus whatever must stay alive for it to keep playing.
#[cfg(feature = "rodio")]
fn open_backend(headless: bool) -> (Arc<dyn AudioBackend>, Option<Box<dyn Any>>) {
    if !headless {
        match tale_audio_core::RodioBackend::open_default() {
            Ok((stream, backend)) => return (Arc::new(backend), Some(Box::new(stream))),
            Err(err) => tracing::warn!(%err, "no output device, running headless"),
        }
    }
    (Arc::new(LogBackend::new()), None)
}

#[cfg(not(feature = "rodio"))]
fn open_backend(_headless: bool) -> (Arc<dyn AudioBackend>, Option<Box<dyn Any>>) {
    (Arc::new(LogBackend::new()), None)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio orchestrator host", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Directory the `/audio/...` namespace is rooted at.
    #[arg(long, global = true)]
    assets: Option<PathBuf>,
    #[arg(long, global = true)]
    bgm_volume: Option<f32>,
    #[arg(long, global = true)]
    sfx_volume: Option<f32>,
    /// Start with audio disabled.
    #[arg(long, global = true)]
    mute: bool,
    /// Log sessions instead of opening an output device.
    #[arg(long, global = true)]
    headless: bool,
    /// Seconds to keep playing before shutting down.
    #[arg(long, global = true, default_value_t = 0.0)]
    hold: f32,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn apply_overrides(&self, audio: &mut AudioConfig) {
        if let Some(root) = &self.assets {
            audio.asset_root = root.clone();
        }
        if let Some(volume) = self.bgm_volume {
            audio.bgm_volume = volume;
        }
        if let Some(volume) = self.sfx_volume {
            audio.sfx_volume = volume;
        }
        if self.mute {
            audio.enabled = false;
        }
        audio.normalize();
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the idle theme for a chapter.
    Idle {
        #[arg(long, default_value_t = 0)]
        chapter: i32,
    },
    /// Play the battle or boss theme for an encounter.
    Battle {
        #[arg(long, default_value_t = 0)]
        chapter: i32,
        #[arg(long)]
        enemy: Option<String>,
        #[arg(long)]
        boss: bool,
    },
    /// Play a catalog music track.
    Track { track: TrackArg },
    /// Play music by logical base name, e.g. `/audio/bgm/idle`.
    Base { key: String },
    /// Play a catalog sound effect.
    Sfx { effect: SfxArg },
    /// Stop the current music.
    Stop,
    /// Show which concrete resource a base name resolves to.
    Resolve { key: String },
    /// Walk through a scripted session.
    Demo,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TrackArg {
    Idle,
    Battle,
}

impl From<TrackArg> for BgmTrack {
    fn from(value: TrackArg) -> Self {
        match value {
            TrackArg::Idle => BgmTrack::Idle,
            TrackArg::Battle => BgmTrack::Battle,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SfxArg {
    Hit,
}

impl From<SfxArg> for Sfx {
    fn from(value: SfxArg) -> Self {
        match value {
            SfxArg::Hit => Sfx::Hit,
        }
    }
}
