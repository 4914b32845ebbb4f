// src/tracking.rs - Per-hand pinch evaluation
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::cooldown::Debouncer;
use crate::geometry::{self, PixelPoint};
use crate::landmarks::{index, FingerTip, Handedness, HandObservation, TriggerKey, TRACKED_LANDMARKS};
use crate::sounds::SoundDispatcher;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Thumb-to-fingertip distance, in pixels, below which a pair is pinched.
    pub proximity_threshold: f32,
    pub fingertips: Vec<FingerTip>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 30.0,
            fingertips: FingerTip::ALL.to_vec(),
        }
    }
}

/// A sample that was handed to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired {
    pub key: TriggerKey,
    pub path: PathBuf,
}

/// What the overlay draws for one hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandAnnotation {
    pub handedness: Handedness,
    /// Tracked landmark id and its pixel position.
    pub markers: Vec<(usize, PixelPoint)>,
    pub pinched: Vec<FingerTip>,
    pub thumb: PixelPoint,
}

impl HandAnnotation {
    pub fn is_close(&self) -> bool {
        !self.pinched.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandOutcome {
    pub annotation: HandAnnotation,
    pub fired: Vec<Fired>,
}

/// Shared by every hand task in a frame. Holds the only cross-hand mutable
/// state, the debouncer.
pub struct PinchTracker {
    config: TrackerConfig,
    debouncer: Debouncer,
    dispatcher: SoundDispatcher,
}

impl PinchTracker {
    pub fn new(config: TrackerConfig, debouncer: Debouncer, dispatcher: SoundDispatcher) -> Self {
        Self {
            config,
            debouncer,
            dispatcher,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    pub fn process_hand(
        &self,
        hand: &HandObservation,
        width: u32,
        height: u32,
        now: Instant,
    ) -> HandOutcome {
        let markers: Vec<(usize, PixelPoint)> = TRACKED_LANDMARKS
            .iter()
            .map(|&id| (id, hand.pixel(id, width, height)))
            .collect();
        let thumb = hand.pixel(index::THUMB_TIP, width, height);

        let mut pinched = Vec::new();
        let mut fired = Vec::new();

        for &tip in &self.config.fingertips {
            let point = hand.pixel(tip.landmark_id(), width, height);
            let dist = geometry::distance(&thumb, &point);
            if dist >= self.config.proximity_threshold {
                continue;
            }

            tracing::debug!("{} thumb/{} pinch at {:.1}px", hand.handedness, tip.name(), dist);
            pinched.push(tip);

            let key = TriggerKey::new(hand.handedness, tip);
            if !self.debouncer.should_fire(key, now) {
                continue;
            }

            if let Some(path) = self.dispatcher.dispatch(key) {
                fired.push(Fired { key, path });
            }
        }

        HandOutcome {
            annotation: HandAnnotation {
                handedness: hand.handedness,
                markers,
                pinched,
                thumb,
            },
            fired,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::landmarks::{Landmark, LANDMARK_COUNT};
    use crate::sounds::tests::RecordingPlayer;
    use crate::sounds::SoundTable;
    use std::time::Duration;
    use tokio::runtime::Handle;

    /// An open hand on a 640x480 frame: fingertips spread 100px apart from
    /// the thumb, which sits at (100, 360).
    pub(crate) fn open_hand(handedness: Handedness) -> HandObservation {
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        landmarks[index::THUMB_TIP] = Landmark { x: 100.0 / 640.0, y: 0.75, z: 0.0 };
        for (i, tip) in FingerTip::ALL.iter().enumerate() {
            let x = (200.0 + 100.0 * i as f32) / 640.0;
            landmarks[tip.landmark_id()] = Landmark { x, y: 0.25, z: 0.0 };
        }
        HandObservation::new(handedness, landmarks)
    }

    /// Moves `tip` to `offset_px` pixels right of the thumb.
    pub(crate) fn pinch(mut hand: HandObservation, tip: FingerTip, offset_px: f32) -> HandObservation {
        let thumb = hand.landmarks[index::THUMB_TIP];
        hand.landmarks[tip.landmark_id()] = Landmark {
            x: thumb.x + offset_px / 640.0,
            y: thumb.y,
            z: 0.0,
        };
        hand
    }

    /// Waits until `expected` samples reached the player, then a little
    /// longer so an extra play would show up too.
    pub(crate) async fn plays_after(player: &RecordingPlayer, expected: usize) -> Vec<PathBuf> {
        for _ in 0..200 {
            if player.played().len() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        player.played()
    }

    pub(crate) fn tracker(player: Arc<RecordingPlayer>) -> PinchTracker {
        let table = Arc::new(SoundTable::with_default_layout("sounds"));
        PinchTracker::new(
            TrackerConfig::default(),
            Debouncer::new(Duration::from_millis(300)),
            SoundDispatcher::new(table, player, Handle::current()),
        )
    }

    #[tokio::test]
    async fn test_open_hand_fires_nothing() {
        let tracker = tracker(Arc::new(RecordingPlayer::default()));
        let outcome = tracker.process_hand(&open_hand(Handedness::Left), 640, 480, Instant::now());

        assert!(outcome.fired.is_empty());
        assert!(!outcome.annotation.is_close());
        assert_eq!(outcome.annotation.markers.len(), 5);
        assert_eq!(outcome.annotation.thumb, PixelPoint::new(100.0, 360.0));
    }

    #[tokio::test]
    async fn test_right_middle_pinch_dispatches_its_sample() {
        let player = Arc::new(RecordingPlayer::default());
        let tracker = tracker(player.clone());
        let hand = pinch(open_hand(Handedness::Right), FingerTip::Middle, 10.0);

        let outcome = tracker.process_hand(&hand, 640, 480, Instant::now());

        assert_eq!(
            outcome.fired,
            vec![Fired {
                key: TriggerKey::new(Handedness::Right, FingerTip::Middle),
                path: PathBuf::from("sounds/right/b.mp3"),
            }]
        );
        assert_eq!(outcome.annotation.pinched, vec![FingerTip::Middle]);
        assert!(outcome.annotation.is_close());
        assert_eq!(
            plays_after(&player, 1).await,
            vec![PathBuf::from("sounds/right/b.mp3")]
        );
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let tracker = tracker(Arc::new(RecordingPlayer::default()));
        let at_threshold = pinch(open_hand(Handedness::Left), FingerTip::Index, 30.0);
        let inside = pinch(open_hand(Handedness::Left), FingerTip::Index, 29.0);
        let now = Instant::now();

        assert!(tracker.process_hand(&at_threshold, 640, 480, now).fired.is_empty());
        assert_eq!(tracker.process_hand(&inside, 640, 480, now).fired.len(), 1);
    }

    #[tokio::test]
    async fn test_rapid_repinch_is_suppressed() {
        let player = Arc::new(RecordingPlayer::default());
        let tracker = tracker(player.clone());
        let hand = pinch(open_hand(Handedness::Left), FingerTip::Ring, 5.0);
        let t0 = Instant::now();

        let first = tracker.process_hand(&hand, 640, 480, t0);
        let second = tracker.process_hand(&hand, 640, 480, t0 + Duration::from_millis(100));
        assert_eq!(first.fired.len() + second.fired.len(), 1);
        // still drawn as close while suppressed
        assert!(second.annotation.is_close());
        assert_eq!(
            plays_after(&player, 1).await,
            vec![PathBuf::from("sounds/left/e.mp3")]
        );

        let later = tracker.process_hand(&hand, 640, 480, t0 + Duration::from_millis(400));
        assert_eq!(later.fired.len(), 1);
        assert_eq!(plays_after(&player, 2).await.len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_fingertip_is_ignored() {
        let player = Arc::new(RecordingPlayer::default());
        let table = Arc::new(SoundTable::with_default_layout("sounds"));
        let tracker = PinchTracker::new(
            TrackerConfig {
                fingertips: vec![FingerTip::Index],
                ..Default::default()
            },
            Debouncer::new(Duration::from_millis(300)),
            SoundDispatcher::new(table, player, Handle::current()),
        );
        let hand = pinch(open_hand(Handedness::Right), FingerTip::Pinky, 5.0);

        let outcome = tracker.process_hand(&hand, 640, 480, Instant::now());
        assert!(outcome.fired.is_empty());
        assert!(outcome.annotation.pinched.is_empty());
    }

    #[tokio::test]
    async fn test_missing_sample_still_starts_cooldown() {
        let tracker = PinchTracker::new(
            TrackerConfig::default(),
            Debouncer::new(Duration::from_millis(300)),
            SoundDispatcher::new(
                Arc::new(SoundTable::new()),
                Arc::new(RecordingPlayer::default()),
                Handle::current(),
            ),
        );
        let hand = pinch(open_hand(Handedness::Left), FingerTip::Index, 5.0);
        let now = Instant::now();

        let outcome = tracker.process_hand(&hand, 640, 480, now);
        assert!(outcome.fired.is_empty());
        assert_eq!(
            tracker
                .debouncer()
                .last_fired(TriggerKey::new(Handedness::Left, FingerTip::Index)),
            Some(now)
        );
    }
}
