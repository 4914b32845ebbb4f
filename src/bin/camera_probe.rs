// src/bin/camera_probe.rs - Check that a camera opens and delivers a frame
use pinch_player::video::{list_cameras, CameraSource, FrameSource};

fn main() {
    tracing_subscriber::fmt::init();

    let index: u32 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0);

    let cameras = list_cameras();
    println!("Found {} camera(s):", cameras.len());
    for (i, name) in &cameras {
        println!("  [{}] {}", i, name);
    }

    println!("\nTesting camera {}...", index);
    let mut camera = match CameraSource::open(index, 640, 480, 30) {
        Ok(camera) => camera,
        Err(e) => {
            println!("✗ {}", e);
            println!("\nPossible causes:");
            println!("1. Camera is being used by another app");
            println!("2. Camera permissions not granted");
            println!("3. No camera connected");
            std::process::exit(1);
        }
    };
    println!("✓ Stream opened");

    match camera.read() {
        Ok(Some(frame)) => println!("✓ Frame captured: {}x{}", frame.width(), frame.height()),
        Ok(None) => println!("✗ Camera returned no frame"),
        Err(e) => println!("✗ {}", e),
    }
    camera.release();
}
