//! Pinch-to-play: watches hands through a webcam and plays a sample whenever
//! the thumb pinches one of the other fingertips.

pub mod app;
pub mod config;
pub mod cooldown;
pub mod detector;
pub mod geometry;
pub mod landmarks;
pub mod pipeline;
pub mod session;
pub mod sounds;
pub mod tracking;
pub mod ui;
pub mod video;
