// src/session.rs - Capture → detect → dispatch → render loop
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;
use tokio::runtime::Runtime;

use crate::detector::LandmarkDetector;
use crate::landmarks::HandObservation;
use crate::pipeline::{FrameOutcome, FramePipeline, PerformanceMetrics};
use crate::sounds::AudioEngine;
use crate::video::FrameSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    CapturingFrame,
    Detecting,
    DispatchingPerHand,
    Rendering,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Continue,
    ExitRequested,
}

/// Where annotated frames end up: the window, or a log in headless runs.
pub trait DisplaySink {
    fn present(
        &mut self,
        frame: &RgbImage,
        outcome: &FrameOutcome,
        metrics: &PerformanceMetrics,
    ) -> Presentation;
}

pub struct Session<S: FrameSource, D: LandmarkDetector> {
    source: S,
    detector: D,
    pipeline: FramePipeline,
    runtime: Runtime,
    mirror: bool,
    state: LoopState,
    metrics: PerformanceMetrics,
    audio: Option<AudioEngine>,
    released: bool,
}

impl<S: FrameSource, D: LandmarkDetector> Session<S, D> {
    pub fn new(source: S, detector: D, pipeline: FramePipeline, runtime: Runtime, mirror: bool) -> Self {
        Self {
            source,
            detector,
            pipeline,
            runtime,
            mirror,
            state: LoopState::CapturingFrame,
            metrics: PerformanceMetrics::new(),
            audio: None,
            released: false,
        }
    }

    /// Keeps the audio output open until the session stops.
    pub fn with_audio(mut self, engine: AudioEngine) -> Self {
        self.audio = Some(engine);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Runs one full frame iteration and returns the state it ends in:
    /// `CapturingFrame` to keep going, `Stopped` once finished.
    pub fn tick(&mut self, sink: &mut dyn DisplaySink) -> LoopState {
        let mut frame: Option<RgbImage> = None;
        let mut hands: Vec<HandObservation> = Vec::new();
        let mut outcome = FrameOutcome::default();
        let mut started = Instant::now();

        loop {
            tracing::trace!(state = ?self.state, "loop");
            self.state = match self.state {
                LoopState::CapturingFrame => match self.source.read() {
                    Ok(Some(mut img)) => {
                        started = Instant::now();
                        if self.mirror {
                            image::imageops::flip_horizontal_in_place(&mut img);
                        }
                        frame = Some(img);
                        LoopState::Detecting
                    }
                    Ok(None) => {
                        tracing::info!("Frame source ended");
                        LoopState::Stopped
                    }
                    Err(e) => {
                        tracing::warn!("Capture failed: {}", e);
                        LoopState::Stopped
                    }
                },
                LoopState::Detecting => match frame.as_ref() {
                    None => LoopState::CapturingFrame,
                    Some(img) => {
                        hands = match self.detector.detect(img) {
                            Ok(hands) => hands,
                            Err(e) => {
                                tracing::warn!("Detection failed, treating frame as empty: {}", e);
                                Vec::new()
                            }
                        };
                        if hands.is_empty() {
                            LoopState::Rendering
                        } else {
                            LoopState::DispatchingPerHand
                        }
                    }
                },
                LoopState::DispatchingPerHand => {
                    let (width, height) = frame.as_ref().map(|f| f.dimensions()).unwrap_or((0, 0));
                    let now = Instant::now();
                    let hands = std::mem::take(&mut hands);
                    outcome = self
                        .runtime
                        .block_on(self.pipeline.process(hands, width, height, now));
                    LoopState::Rendering
                }
                LoopState::Rendering => {
                    self.metrics.record(started.elapsed().as_secs_f32());
                    let presented = match frame.take() {
                        Some(img) => sink.present(&img, &outcome, &self.metrics),
                        None => Presentation::Continue,
                    };
                    match presented {
                        Presentation::Continue => {
                            self.state = LoopState::CapturingFrame;
                            return self.state;
                        }
                        Presentation::ExitRequested => {
                            tracing::info!("Exit requested");
                            LoopState::Stopped
                        }
                    }
                }
                LoopState::Stopped => {
                    self.stop();
                    return LoopState::Stopped;
                }
            };
        }
    }

    /// Drives `tick` until the loop stops.
    pub fn run(&mut self, sink: &mut dyn DisplaySink) {
        while self.tick(sink) != LoopState::Stopped {}
    }

    /// Releases the frame source, the detector and the audio output. Safe to
    /// call more than once.
    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
        if self.released {
            return;
        }
        self.released = true;
        self.source.release();
        self.detector.shutdown();
        self.audio = None;
        tracing::info!("Session stopped after {} frames", self.metrics.frames);
    }
}

impl<S: FrameSource, D: LandmarkDetector> Drop for Session<S, D> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Headless sink: logs what fired and stops on Ctrl-C.
pub struct LogSink {
    interrupted: Arc<AtomicBool>,
}

impl LogSink {
    pub fn new(interrupted: Arc<AtomicBool>) -> Self {
        Self { interrupted }
    }

    /// Sets the returned flag when Ctrl-C arrives.
    pub fn watch_ctrl_c(runtime: &Runtime) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        let watcher = flag.clone();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                watcher.store(true, Ordering::SeqCst);
            }
        });
        flag
    }
}

impl DisplaySink for LogSink {
    fn present(
        &mut self,
        _frame: &RgbImage,
        outcome: &FrameOutcome,
        metrics: &PerformanceMetrics,
    ) -> Presentation {
        for hand in &outcome.hands {
            if hand.is_close() {
                tracing::debug!("{} hand close: {:?}", hand.handedness, hand.pinched);
            }
        }
        if metrics.frames % 300 == 0 {
            tracing::info!(
                frames = metrics.frames,
                fps = format!("{:.1}", metrics.avg_fps),
                "headless timings"
            );
        }

        if self.interrupted.load(Ordering::SeqCst) {
            Presentation::ExitRequested
        } else {
            Presentation::Continue
        }
    }
}
