// src/pipeline.rs - Join-all over the hands detected in one frame
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use crate::landmarks::HandObservation;
use crate::tracking::{Fired, HandAnnotation, PinchTracker};

/// Everything the renderer needs to know about one processed frame.
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    pub hands: Vec<HandAnnotation>,
    pub fired: Vec<Fired>,
}

#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    pub avg_fps: f32,
    pub avg_processing_time: f32,
    pub frames: u64,
    frame_times: VecDeque<f32>,
}

impl PerformanceMetrics {
    const WINDOW: usize = 30;

    pub fn new() -> Self {
        Self {
            avg_fps: 0.0,
            avg_processing_time: 0.0,
            frames: 0,
            frame_times: VecDeque::with_capacity(Self::WINDOW),
        }
    }

    pub fn record(&mut self, seconds: f32) {
        self.frames += 1;
        self.frame_times.push_front(seconds);
        if self.frame_times.len() > Self::WINDOW {
            self.frame_times.pop_back();
        }

        self.avg_processing_time =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        self.avg_fps = if self.avg_processing_time > 0.0 {
            1.0 / self.avg_processing_time
        } else {
            0.0
        };
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FramePipeline {
    tracker: Arc<PinchTracker>,
    max_hands: usize,
}

impl FramePipeline {
    pub fn new(tracker: PinchTracker, max_hands: usize) -> Self {
        Self {
            tracker: Arc::new(tracker),
            max_hands,
        }
    }

    pub fn tracker(&self) -> &PinchTracker {
        &self.tracker
    }

    /// Runs every hand as its own task and waits for all of them. Annotation
    /// order follows task completion, not detection order.
    pub async fn process(
        &self,
        hands: Vec<HandObservation>,
        width: u32,
        height: u32,
        now: Instant,
    ) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();
        if hands.is_empty() {
            return outcome;
        }

        if hands.len() > self.max_hands {
            tracing::debug!("{} hands detected, keeping {}", hands.len(), self.max_hands);
        }

        let mut tasks = JoinSet::new();
        for hand in hands.into_iter().take(self.max_hands) {
            let tracker = self.tracker.clone();
            tasks.spawn(async move { tracker.process_hand(&hand, width, height, now) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(hand) => {
                    outcome.hands.push(hand.annotation);
                    outcome.fired.extend(hand.fired);
                }
                Err(e) => tracing::warn!("hand task failed: {}", e),
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooldown::Debouncer;
    use crate::landmarks::{FingerTip, Handedness, TriggerKey};
    use crate::sounds::tests::RecordingPlayer;
    use crate::sounds::{SoundDispatcher, SoundTable};
    use crate::tracking::tests::{open_hand, pinch, tracker};
    use crate::tracking::TrackerConfig;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::runtime::Handle;

    fn pipeline(player: Arc<RecordingPlayer>) -> FramePipeline {
        FramePipeline::new(tracker(player), 2)
    }

    #[tokio::test]
    async fn test_no_hands_no_dispatch() {
        let player = Arc::new(RecordingPlayer::default());
        let outcome = pipeline(player.clone())
            .process(Vec::new(), 640, 480, Instant::now())
            .await;

        assert!(outcome.hands.is_empty());
        assert!(outcome.fired.is_empty());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(player.played().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_both_hands_pinch_index() {
        let player = Arc::new(RecordingPlayer::default());
        let pipeline = pipeline(player.clone());
        let hands = vec![
            pinch(open_hand(Handedness::Left), FingerTip::Index, 5.0),
            pinch(open_hand(Handedness::Right), FingerTip::Index, 5.0),
        ];

        let outcome = pipeline.process(hands, 640, 480, Instant::now()).await;

        assert_eq!(outcome.hands.len(), 2);
        let mut paths: Vec<PathBuf> = outcome.fired.iter().map(|f| f.path.clone()).collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("sounds/left/c.mp3"),
                PathBuf::from("sounds/right/a.mp3"),
            ]
        );

        for _ in 0..100 {
            if player.played().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(player.played().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_duplicate_label_fires_once() {
        // Detector mislabels both hands as Left and both pinch the index tip.
        let pipeline = pipeline(Arc::new(RecordingPlayer::default()));
        let hands = vec![
            pinch(open_hand(Handedness::Left), FingerTip::Index, 5.0),
            pinch(open_hand(Handedness::Left), FingerTip::Index, 5.0),
        ];

        let outcome = pipeline.process(hands, 640, 480, Instant::now()).await;

        assert_eq!(outcome.hands.len(), 2);
        assert_eq!(
            outcome.fired.iter().map(|f| f.key).collect::<Vec<_>>(),
            vec![TriggerKey::new(Handedness::Left, FingerTip::Index)]
        );
    }

    #[tokio::test]
    async fn test_hand_cap() {
        let pipeline = FramePipeline::new(
            PinchTracker::new(
                TrackerConfig::default(),
                Debouncer::new(Duration::from_millis(300)),
                SoundDispatcher::new(
                    Arc::new(SoundTable::with_default_layout("sounds")),
                    Arc::new(RecordingPlayer::default()),
                    Handle::current(),
                ),
            ),
            1,
        );
        let hands = vec![open_hand(Handedness::Left), open_hand(Handedness::Right)];

        let outcome = pipeline.process(hands, 640, 480, Instant::now()).await;
        assert_eq!(outcome.hands.len(), 1);
        assert_eq!(outcome.hands[0].handedness, Handedness::Left);
    }

    #[test]
    fn test_metrics_window() {
        let mut metrics = PerformanceMetrics::new();
        for _ in 0..40 {
            metrics.record(0.05);
        }
        metrics.record(0.02);

        assert_eq!(metrics.frames, 41);
        let expected = (29.0 * 0.05 + 0.02) / 30.0;
        assert!((metrics.avg_processing_time - expected).abs() < 1e-5);
        assert!((metrics.avg_fps - 1.0 / expected).abs() < 1e-2);
    }
}
