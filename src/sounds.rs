// src/sounds.rs - Sample table, audio engine and fire-and-forget playback
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Source};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::landmarks::{FingerTip, Handedness, TriggerKey};

/// Static map from trigger key to a sample file. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct SoundTable {
    paths: HashMap<TriggerKey, PathBuf>,
}

impl SoundTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock eight-note layout under `dir`.
    pub fn with_default_layout(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let layout = [
            (Handedness::Left, FingerTip::Index, "left/c.mp3"),
            (Handedness::Left, FingerTip::Middle, "left/d.mp3"),
            (Handedness::Left, FingerTip::Ring, "left/e.mp3"),
            (Handedness::Left, FingerTip::Pinky, "left/f.mp3"),
            (Handedness::Right, FingerTip::Index, "right/a.mp3"),
            (Handedness::Right, FingerTip::Middle, "right/b.mp3"),
            (Handedness::Right, FingerTip::Ring, "right/c.mp3"),
            (Handedness::Right, FingerTip::Pinky, "right/g.mp3"),
        ];

        let mut table = Self::new();
        for (hand, tip, file) in layout {
            table.insert(TriggerKey::new(hand, tip), dir.join(file));
        }
        table
    }

    pub fn insert(&mut self, key: TriggerKey, path: impl Into<PathBuf>) {
        self.paths.insert(key, path.into());
    }

    pub fn path(&self, key: TriggerKey) -> Option<&Path> {
        self.paths.get(&key).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Entries whose file does not exist on disk.
    pub fn missing_files(&self) -> Vec<(TriggerKey, &Path)> {
        let mut missing: Vec<_> = self
            .paths
            .iter()
            .filter(|(_, path)| !path.exists())
            .map(|(key, path)| (*key, path.as_path()))
            .collect();
        missing.sort_by_key(|(key, _)| key.to_string());
        missing
    }
}

/// Starts playback of one sample and returns without waiting for it to end.
pub trait SamplePlayer: Send + Sync {
    fn play(&self, path: &Path) -> Result<()>;
}

/// Owns the audio output device. Dropping it silences everything.
pub struct AudioEngine {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioEngine {
    pub fn open_default() -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("Failed to open default audio output")?;
        tracing::info!("Audio output opened");
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    pub fn player(&self) -> RodioPlayer {
        RodioPlayer {
            handle: self.handle.clone(),
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        tracing::info!("Audio output closed");
    }
}

/// Decodes a file and hands it to the output mixer.
#[derive(Clone)]
pub struct RodioPlayer {
    handle: OutputStreamHandle,
}

impl SamplePlayer for RodioPlayer {
    fn play(&self, path: &Path) -> Result<()> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open sample {}", path.display()))?;
        let source = Decoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to decode sample {}", path.display()))?;
        self.handle
            .play_raw(source.convert_samples())
            .with_context(|| format!("Failed to play sample {}", path.display()))?;
        Ok(())
    }
}

/// Resolves trigger keys to samples and queues playback on the runtime's
/// blocking pool. Callers never wait on the returned handle.
#[derive(Clone)]
pub struct SoundDispatcher {
    table: Arc<SoundTable>,
    player: Arc<dyn SamplePlayer>,
    runtime: Handle,
}

impl SoundDispatcher {
    pub fn new(table: Arc<SoundTable>, player: Arc<dyn SamplePlayer>, runtime: Handle) -> Self {
        Self {
            table,
            player,
            runtime,
        }
    }

    pub fn table(&self) -> &SoundTable {
        &self.table
    }

    /// Queues the sample for `key`. Keys without a sample are skipped.
    pub fn dispatch(&self, key: TriggerKey) -> Option<PathBuf> {
        let Some(path) = self.table.path(key) else {
            tracing::debug!(%key, "no sample configured, skipping");
            return None;
        };
        let path = path.to_path_buf();

        tracing::info!(%key, path = %path.display(), "Playing sound");
        self.play(path.clone());
        Some(path)
    }

    pub fn play(&self, path: PathBuf) -> JoinHandle<()> {
        let player = self.player.clone();
        self.runtime.spawn_blocking(move || {
            if let Err(e) = player.play(&path) {
                tracing::warn!("Playback failed for {}: {:#}", path.display(), e);
            }
        })
    }
}
