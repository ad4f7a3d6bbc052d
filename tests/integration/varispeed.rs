//! Varispeed away from 1.0: frame counts per fill and signal shape.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use approx::assert_abs_diff_eq;
use tempfile::tempdir;
use varideck::prelude::*;
use varideck::stream::varispeed::{playback_request_frames, record_request_frames};

#[test]
fn test_request_sizes_at_double_speed() {
    assert_eq!(record_request_frames(2048, 2.0), 4096);
    assert_eq!(playback_request_frames(2048, 2.0), 1024);
    assert_eq!(record_request_frames(2048, 1.0), 2048);
    assert_eq!(playback_request_frames(2048, 1.0), 2048);
}

/// Recording at 2.0 writes twice as many frames as were captured, and a
/// ramp stays a ramp at half the slope.
#[test]
fn test_record_at_double_speed_doubles_length() {
    let dir = tempdir().unwrap();
    let take = temp_wav(&dir, "take.wav");
    let record_frames = small_buffers().record_frames;
    let captured_frames = 4 * record_frames + 1;
    let captured = generate_ramp(captured_frames);

    let mut session = offline_session((1, 1), Some(&take), None, 2.0);
    run_blocks(&mut session, &captured, 1, 1, captured_frames);
    session.finish();

    let (recorded, _) = read_wav(&take);
    let expected = 2 * 4 * record_frames;
    assert!(
        recorded.len() <= expected && recorded.len() + FRAME_COUNT_SLACK >= expected,
        "recorded {} frames, expected about {}",
        recorded.len(),
        expected
    );

    let step = 0.5 / captured_frames as f32;
    for (k, &sample) in recorded.iter().enumerate() {
        assert!(
            (sample - k as f32 * step).abs() <= DSP_EPSILON,
            "frame {}: {} != {}",
            k,
            sample,
            k as f32 * step
        );
    }
}

/// Playback at 2.0 consumes two source frames per output frame.
#[test]
fn test_playback_at_double_speed_skips_every_other_frame() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "play.wav");
    // Eight whole fills of 128 output frames each.
    let source = generate_ramp(2048);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session = offline_session((1, 1), None, Some(&play), 2.0);
    let output = run_blocks(&mut session, &[], 1, 1, 1200);

    for k in 0..1024 {
        assert_abs_diff_eq!(output[k], source[2 * k], epsilon = FLOAT_EPSILON);
    }
    assert_silence(&output[1024..], SILENCE_THRESHOLD);
    assert!(session.is_playback_finished());
    assert_eq!(session.stats().underruns, 0);
}

/// Playback at 0.5 interpolates between source frames.
#[test]
fn test_playback_at_half_speed_interpolates() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "play.wav");
    // Enough source for three whole fills of 512 output frames.
    let source = generate_ramp(1200);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session = offline_session((1, 1), None, Some(&play), 0.5);
    let output = run_blocks(&mut session, &[], 1, 1, 1000);

    let step = 0.5 / source.len() as f32;
    for (k, &sample) in output.iter().enumerate() {
        assert!(
            (sample - k as f32 * step).abs() <= DSP_EPSILON,
            "frame {}: {} != {}",
            k,
            sample,
            k as f32 * step
        );
    }
    assert!(!session.is_playback_finished());
}

/// Latching each half's fill count, a ratio change mid-stream applies from
/// the next fill without a gap.
#[test]
fn test_speed_change_applies_at_next_fill() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "play.wav");
    let playback_frames = small_buffers().playback_frames;
    let source = generate_ramp(8 * playback_frames);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session =
        offline_session_in_mode((1, 1), None, Some(&play), 1.0, ThresholdMode::PerBuffer);
    // The primed half and the half filled after the first flip are at 1.0.
    let first = run_blocks(&mut session, &[], 1, 1, 64);
    assert_eq!(session.set_varispeed(2.0), 2.0);
    let rest = run_blocks(&mut session, &[], 1, 1, 2 * playback_frames);

    let output: Vec<f32> = first.into_iter().chain(rest).collect();
    assert!(signals_approx_equal(
        &output[..2 * playback_frames],
        &source[..2 * playback_frames],
        FLOAT_EPSILON
    ));
    // First half filled at 2.0 picks up where unity playback stopped.
    for k in 0..64 {
        let expected = source[2 * playback_frames + 2 * k];
        assert_abs_diff_eq!(output[2 * playback_frames + k], expected, epsilon = FLOAT_EPSILON);
    }
}

/// With the default threshold, the first fill at the new ratio is shorter
/// and cuts the unity half already playing down to its own count.
#[test]
fn test_speed_change_cuts_playing_half_by_default() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "play.wav");
    let playback_frames = small_buffers().playback_frames;
    let source = generate_ramp(8 * playback_frames);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session = offline_session((1, 1), None, Some(&play), 1.0);
    let first = run_blocks(&mut session, &[], 1, 1, 64);
    session.set_varispeed(2.0);
    let rest = run_blocks(&mut session, &[], 1, 1, 2 * playback_frames);
    let output: Vec<f32> = first.into_iter().chain(rest).collect();

    // The second unity half (source 256..512) starts at frame 256; the
    // 128-frame fill at 2.0 lands after that block and ends it at 384.
    let cut = playback_frames + playback_frames / 2;
    assert!(signals_approx_equal(
        &output[..cut],
        &source[..cut],
        FLOAT_EPSILON
    ));
    for k in 0..playback_frames / 2 {
        let expected = source[2 * playback_frames + 2 * k];
        assert_abs_diff_eq!(output[cut + k], expected, epsilon = FLOAT_EPSILON);
    }
    assert_eq!(session.stats().underruns, 0);
}

/// Ratios outside the supported range are clamped; nonsense is ignored.
#[test]
fn test_varispeed_clamped_to_range() {
    let session = offline_session((1, 1), None, None, 1.0);
    let max = small_buffers().max_varispeed;

    assert_eq!(session.set_varispeed(1000.0), max);
    assert_eq!(session.set_varispeed(0.0001), 1.0 / max);
    assert_eq!(session.set_varispeed(f64::NAN), 1.0 / max);
    assert_eq!(session.set_varispeed(-2.0), 1.0 / max);
    assert_eq!(session.context().varispeed(), 1.0 / max);
}
