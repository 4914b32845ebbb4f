// src/config.rs - Runtime settings, filled from command-line flags
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::RangedU64ValueParser;
use clap::error::ErrorKind;
use clap::Parser;
use thiserror::Error;

use crate::detector::DetectorConfig;
use crate::landmarks::FingerTip;
use crate::tracking::TrackerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("invalid value for '--{option}': {reason}")]
    InvalidValue { option: &'static str, reason: String },
}

impl ConfigError {
    /// `--help` and `--version` come back from clap as errors.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            ConfigError::Args(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
        )
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pinch_player",
    version,
    about = "Plays a sample whenever the thumb pinches a fingertip in front of the webcam",
    long_about = None
)]
struct Cli {
    /// Camera index
    #[arg(long, conflicts_with = "frames")]
    camera: Option<u32>,

    /// Replay still frames from a directory instead of a camera
    #[arg(long, value_name = "DIR")]
    frames: Option<PathBuf>,

    /// Frame width in pixels
    #[arg(long, default_value_t = 640, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Frame height in pixels
    #[arg(long, default_value_t = 480, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Requested camera frame rate
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Thumb-to-fingertip distance in pixels that counts as a pinch
    #[arg(long, default_value_t = 30.0, value_name = "PX")]
    threshold: f32,

    /// Retrigger cooldown per hand and fingertip
    #[arg(long, default_value_t = 300, value_name = "MS")]
    cooldown_ms: u64,

    /// Fingertips to watch: index, middle, ring, pinky (or landmark ids)
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    fingers: Vec<FingerTip>,

    /// Sample directory
    #[arg(long, default_value = "./sounds", value_name = "DIR")]
    sounds: PathBuf,

    /// Playback worker threads
    #[arg(long, default_value_t = 2, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    workers: usize,

    /// Hands processed per frame
    #[arg(long, default_value_t = 2, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    max_hands: usize,

    /// MediaPipe detection and tracking confidence, 0 to 1
    #[arg(long, default_value_t = 0.75)]
    min_confidence: f32,

    /// Interpreter for the detector script
    #[arg(long, default_value = "python3", value_name = "PATH")]
    python: PathBuf,

    /// Hand detector script
    #[arg(long, default_value = "scripts/hand_detect.py", value_name = "PATH")]
    detector_script: PathBuf,

    /// Do not flip frames horizontally
    #[arg(long)]
    no_mirror: bool,

    /// No window; log triggers until the source ends or Ctrl-C
    #[arg(long)]
    headless: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Camera(u32),
    Directory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceKind,
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: u32,
    pub mirror: bool,
    pub tracker: TrackerConfig,
    pub cooldown: Duration,
    pub sounds_dir: PathBuf,
    pub playback_workers: usize,
    pub detector: DetectorConfig,
    pub headless: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceKind::Camera(0),
            frame_width: 640,
            frame_height: 480,
            fps: 30,
            mirror: true,
            tracker: TrackerConfig::default(),
            cooldown: Duration::from_millis(300),
            sounds_dir: PathBuf::from("./sounds"),
            playback_workers: 2,
            detector: DetectorConfig::default(),
            headless: false,
        }
    }
}

impl Config {
    /// Parses a full argument list, program name first.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::from_cli(Cli::try_parse_from(args)?)
    }

    fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if !(cli.threshold.is_finite() && cli.threshold > 0.0) {
            return Err(ConfigError::InvalidValue {
                option: "threshold",
                reason: format!("{} is not a positive distance", cli.threshold),
            });
        }
        if !(0.0..=1.0).contains(&cli.min_confidence) {
            return Err(ConfigError::InvalidValue {
                option: "min-confidence",
                reason: format!("{} is outside 0..=1", cli.min_confidence),
            });
        }

        let mut fingertips = Vec::new();
        for tip in cli.fingers {
            if !fingertips.contains(&tip) {
                fingertips.push(tip);
            }
        }
        if fingertips.is_empty() {
            fingertips = FingerTip::ALL.to_vec();
        }

        let source = match cli.frames {
            Some(dir) => SourceKind::Directory(dir),
            None => SourceKind::Camera(cli.camera.unwrap_or(0)),
        };

        Ok(Config {
            source,
            frame_width: cli.width,
            frame_height: cli.height,
            fps: cli.fps,
            mirror: !cli.no_mirror,
            tracker: TrackerConfig {
                proximity_threshold: cli.threshold,
                fingertips,
            },
            cooldown: Duration::from_millis(cli.cooldown_ms),
            sounds_dir: cli.sounds,
            playback_workers: cli.workers,
            detector: DetectorConfig {
                python: cli.python,
                script: cli.detector_script,
                min_confidence: cli.min_confidence,
                max_hands: cli.max_hands,
            },
            headless: cli.headless,
        })
    }
}
