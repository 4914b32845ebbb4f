// src/landmarks.rs - Hand observation types shared by the detector and the tracker
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::geometry::{self, PixelPoint};

/// MediaPipe hand landmark indices used by the pinch gesture.
pub mod index {
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;
}

/// Number of landmarks the hand model reports per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Thumb tip followed by the four fingertips, in drawing order.
pub const TRACKED_LANDMARKS: [usize; 5] = [
    index::THUMB_TIP,
    index::INDEX_FINGER_TIP,
    index::MIDDLE_FINGER_TIP,
    index::RING_FINGER_TIP,
    index::PINKY_TIP,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn label(self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown handedness label '{0}'")]
pub struct UnknownHandedness(pub String);

impl FromStr for Handedness {
    type Err = UnknownHandedness;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Left" | "left" => Ok(Handedness::Left),
            "Right" | "right" => Ok(Handedness::Right),
            other => Err(UnknownHandedness(other.to_string())),
        }
    }
}

/// A non-thumb fingertip the thumb can pinch against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerTip {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl FingerTip {
    pub const ALL: [FingerTip; 4] = [
        FingerTip::Index,
        FingerTip::Middle,
        FingerTip::Ring,
        FingerTip::Pinky,
    ];

    pub fn landmark_id(self) -> usize {
        match self {
            FingerTip::Index => index::INDEX_FINGER_TIP,
            FingerTip::Middle => index::MIDDLE_FINGER_TIP,
            FingerTip::Ring => index::RING_FINGER_TIP,
            FingerTip::Pinky => index::PINKY_TIP,
        }
    }

    pub fn from_landmark_id(id: usize) -> Option<Self> {
        FingerTip::ALL.into_iter().find(|tip| tip.landmark_id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            FingerTip::Index => "index",
            FingerTip::Middle => "middle",
            FingerTip::Ring => "ring",
            FingerTip::Pinky => "pinky",
        }
    }
}

impl FromStr for FingerTip {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<usize>() {
            return FingerTip::from_landmark_id(id)
                .ok_or_else(|| format!("landmark {} is not a fingertip", id));
        }
        FingerTip::ALL
            .into_iter()
            .find(|tip| tip.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown fingertip '{}'", s))
    }
}

/// One independent cooldown and sound channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerKey {
    pub hand: Handedness,
    pub tip: FingerTip,
}

impl TriggerKey {
    pub fn new(hand: Handedness, tip: FingerTip) -> Self {
        Self { hand, tip }
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.hand, self.tip.landmark_id())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A detected hand for a single frame, in normalized image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    pub handedness: Handedness,
    pub score: f32,
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl HandObservation {
    pub fn new(handedness: Handedness, landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self {
            handedness,
            score: 1.0,
            landmarks,
        }
    }

    pub fn pixel(&self, landmark: usize, width: u32, height: u32) -> PixelPoint {
        let lm = &self.landmarks[landmark];
        geometry::to_pixel(lm.x, lm.y, width, height)
    }
}
