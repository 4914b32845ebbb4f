// src/main.rs
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};

use pinch_player::app;
use pinch_player::config::{Config, SourceKind};
use pinch_player::cooldown::Debouncer;
use pinch_player::detector::{LandmarkDetector, MediaPipeBridge, NoHands};
use pinch_player::pipeline::FramePipeline;
use pinch_player::session::{LogSink, Session};
use pinch_player::sounds::{AudioEngine, SoundDispatcher, SoundTable};
use pinch_player::tracking::PinchTracker;
use pinch_player::video::{list_cameras, CameraSource, FrameDirectory, FrameSource};

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = match Config::from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(e) if e.is_informational() => {
            println!("{}", e);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .max_blocking_threads(config.playback_workers)
        .thread_name("pinch-worker")
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    let table = SoundTable::with_default_layout(&config.sounds_dir);
    for (key, path) in table.missing_files() {
        tracing::warn!(%key, "Sample not found: {}", path.display());
    }

    let audio = AudioEngine::open_default()?;
    let dispatcher = SoundDispatcher::new(
        Arc::new(table),
        Arc::new(audio.player()),
        runtime.handle().clone(),
    );
    let tracker = PinchTracker::new(config.tracker.clone(), Debouncer::new(config.cooldown), dispatcher);
    let pipeline = FramePipeline::new(tracker, config.detector.max_hands);

    let source = open_source(&config)?;
    let detector: Box<dyn LandmarkDetector> = match MediaPipeBridge::spawn(&config.detector) {
        Ok(bridge) => Box::new(bridge),
        Err(e) => {
            tracing::warn!("Hand detection unavailable, running without it: {:#}", e);
            Box::new(NoHands)
        }
    };

    let mut session = Session::new(source, detector, pipeline, runtime, config.mirror).with_audio(audio);

    if config.headless {
        let interrupted = LogSink::watch_ctrl_c(session.runtime());
        session.run(&mut LogSink::new(interrupted));
        Ok(())
    } else {
        app::run_window(session, config.frame_width, config.frame_height)
    }
}

fn open_source(config: &Config) -> Result<Box<dyn FrameSource>> {
    match &config.source {
        SourceKind::Camera(index) => {
            let cameras = list_cameras();
            tracing::info!("Found {} camera(s)", cameras.len());
            for (i, name) in &cameras {
                tracing::info!("  [{}] {}", i, name);
            }

            let camera = CameraSource::open(*index, config.frame_width, config.frame_height, config.fps)?;
            Ok(Box::new(camera))
        }
        SourceKind::Directory(dir) => {
            let frames = FrameDirectory::open(dir, config.frame_width, config.frame_height)?;
            Ok(Box::new(frames))
        }
    }
}
