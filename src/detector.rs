// src/detector.rs - MediaPipe Hands bridge over a child process
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use anyhow::{Context, Result};
use image::RgbImage;
use serde::Deserialize;
use thiserror::Error;

use crate::landmarks::{Handedness, HandObservation, Landmark, LANDMARK_COUNT};

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("detector I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("detector closed its output")]
    Closed,
    #[error("malformed detector response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("detector reported: {0}")]
    Reported(String),
}

/// Anything that turns a frame into hand observations.
pub trait LandmarkDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandObservation>, DetectionError>;

    fn shutdown(&mut self) {}
}

impl<T: LandmarkDetector + ?Sized> LandmarkDetector for Box<T> {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandObservation>, DetectionError> {
        (**self).detect(frame)
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub python: PathBuf,
    pub script: PathBuf,
    pub min_confidence: f32,
    pub max_hands: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python3"),
            script: PathBuf::from("scripts/hand_detect.py"),
            min_confidence: 0.75,
            max_hands: 2,
        }
    }
}

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    handedness: String,
    #[serde(default = "full_score")]
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionResponse {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

fn full_score() -> f32 {
    1.0
}

/// Parses one response line into observations, dropping hands that are
/// mislabelled or short of landmarks. Confidence filtering already happened
/// inside MediaPipe; `score` is the handedness certainty and is kept as is.
pub fn parse_response(line: &str) -> Result<Vec<HandObservation>, DetectionError> {
    let response: DetectionResponse = serde_json::from_str(line.trim())?;

    if let Some(error) = response.error {
        return Err(DetectionError::Reported(error));
    }

    let mut hands = Vec::with_capacity(response.hands.len());
    for hand in response.hands {
        let handedness = match hand.handedness.parse::<Handedness>() {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("{}", e);
                continue;
            }
        };

        if hand.landmarks.len() < LANDMARK_COUNT {
            tracing::warn!(
                "Expected {} landmarks, got {}",
                LANDMARK_COUNT,
                hand.landmarks.len()
            );
            continue;
        }

        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (slot, lm) in landmarks.iter_mut().zip(hand.landmarks.iter()) {
            *slot = Landmark {
                x: lm.x,
                y: lm.y,
                z: lm.z,
            };
        }

        hands.push(HandObservation {
            handedness,
            score: hand.score,
            landmarks,
        });
    }

    Ok(hands)
}

pub struct MediaPipeBridge {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl MediaPipeBridge {
    /// Starts the detector child process and waits for its READY line.
    pub fn spawn(config: &DetectorConfig) -> Result<Self> {
        if !config.script.exists() {
            anyhow::bail!("Hand detection script not found at {}", config.script.display());
        }

        tracing::info!("Starting MediaPipe hand detector...");

        let mut process = Command::new(&config.python)
            .arg(&config.script)
            .arg("--max-hands")
            .arg(config.max_hands.to_string())
            .arg("--min-confidence")
            .arg(config.min_confidence.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to start {}", config.python.display()))?;

        let stdin = process.stdin.take().context("Detector stdin unavailable")?;
        let stdout = process.stdout.take().context("Detector stdout unavailable")?;
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        stdout
            .read_line(&mut ready)
            .context("Detector exited before signalling ready")?;
        if ready.trim() != "READY" {
            let _ = process.kill();
            anyhow::bail!("Detector did not signal ready, got: {:?}", ready.trim());
        }

        tracing::info!("✓ MediaPipe hand detector ready");

        Ok(Self {
            process,
            stdin,
            stdout,
        })
    }
}

impl LandmarkDetector for MediaPipeBridge {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandObservation>, DetectionError> {
        // header: width, height, channels (little endian u32) then raw RGB
        self.stdin.write_all(&frame.width().to_le_bytes())?;
        self.stdin.write_all(&frame.height().to_le_bytes())?;
        self.stdin.write_all(&3u32.to_le_bytes())?;
        self.stdin.write_all(frame.as_raw())?;
        self.stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(DetectionError::Closed);
        }

        parse_response(&line)
    }

    fn shutdown(&mut self) {
        if let Ok(None) = self.process.try_wait() {
            tracing::info!("Shutting down MediaPipe...");
            let _ = self.process.kill();
            let _ = self.process.wait();
        }
    }
}

impl Drop for MediaPipeBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Stands in when the real detector cannot start: every frame has no hands.
pub struct NoHands;

impl LandmarkDetector for NoHands {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<HandObservation>, DetectionError> {
        Ok(Vec::new())
    }
}
