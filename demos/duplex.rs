//! # Duplex
//!
//! Record the default input to `record.wav` while playing `play.wav`,
//! sweeping the playback speed from half to double and back.
//!
//! **Concepts:** `VarideckEngine`, `set_varispeed()`, duplex events
//!
//! ```bash
//! PLAY_FILE=take.wav cargo run --example duplex --features host
//! ```

use std::time::Duration;
use varideck::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let play_path = std::env::var("PLAY_FILE").unwrap_or_else(|_| "play.wav".to_string());
    let record_path = std::env::var("RECORD_FILE").unwrap_or_else(|_| "record.wav".to_string());

    if !std::path::Path::new(&play_path).exists() {
        println!("Playback file not found: {}", play_path);
        println!("Set PLAY_FILE=/path/to/float32.wav; recording only.");
    }

    let mut engine = VarideckEngine::builder()
        .use_default_devices()?
        .record_path(&record_path)
        .playback_path(&play_path)
        .build()?;

    engine.start()?;
    println!(
        "Recording to {} at {} Hz (playing: {})",
        record_path,
        engine.sample_rate(),
        engine.is_playing()
    );

    let sweep = [1.0, 0.5, 0.75, 1.0, 1.5, 2.0, 1.0];
    for ratio in sweep {
        let applied = engine.set_varispeed(ratio);
        println!("varispeed {:.2}", applied);
        std::thread::sleep(Duration::from_secs(2));

        for event in engine.events().try_iter() {
            println!("  event: {:?}", event);
        }
        if engine.is_playback_finished() {
            println!("Playback finished");
        }
    }

    engine.shutdown();
    let stats = engine.stats();
    println!(
        "Wrote {} frames, read {} frames, {} overruns, {} underruns",
        stats.frames_written, stats.frames_read, stats.overruns, stats.underruns
    );

    Ok(())
}
