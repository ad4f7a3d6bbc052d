//! Record and playback paths at unity speed.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use approx::assert_abs_diff_eq;
use tempfile::tempdir;
use varideck::prelude::*;

/// Playback at 1.0 reproduces the file sample for sample, then goes silent
/// and reports the end of the stream once.
#[test]
fn test_playback_unity_reproduces_file() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "play.wav");
    // Four whole fills, so every fill count matches the half it bounds.
    let source = generate_ramp(4 * small_buffers().playback_frames);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session = offline_session((1, 1), None, Some(&play), 1.0);
    assert!(session.is_playing());
    assert!(!session.is_recording());

    let output = run_blocks(&mut session, &[], 1, 1, 1200);

    assert!(signals_approx_equal(&output[..1024], &source, FLOAT_EPSILON));
    assert_silence(&output[1024..], SILENCE_THRESHOLD);
    assert!(session.is_playback_finished());

    let events = drain_events(&session);
    let ended = events
        .iter()
        .filter(|e| **e == DuplexEvent::PlaybackEnded)
        .count();
    assert_eq!(ended, 1);
    assert!(!events.contains(&DuplexEvent::Underrun));

    let stats = session.stats();
    assert_eq!(stats.frames_read, 1024);
    assert_eq!(stats.underruns, 0);
}

/// With the default threshold, a short final fill that completes while a
/// full half plays ends that half early at the short count.
#[test]
fn test_short_final_fill_bounds_playing_half() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "play.wav");
    let source = generate_ramp(1000);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session = offline_session((1, 1), None, Some(&play), 1.0);
    let output = run_blocks(&mut session, &[], 1, 1, 1200);

    // Halves hold 0..256, 256..512, 512..768 and 768..1000. The 232-frame
    // fill lands while 512..768 plays, cutting it at 512 + 232.
    assert!(signals_approx_equal(&output[..744], &source[..744], FLOAT_EPSILON));
    assert!(signals_approx_equal(
        &output[744..976],
        &source[768..],
        FLOAT_EPSILON
    ));
    assert_silence(&output[976..], SILENCE_THRESHOLD);
    assert!(session.is_playback_finished());
    assert_eq!(session.stats().frames_read, 1000);
    assert_eq!(session.stats().underruns, 0);
}

/// Latching each half's own fill count plays every frame of a file that
/// ends mid-fill.
#[test]
fn test_per_buffer_threshold_plays_every_frame() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "play.wav");
    let source = generate_ramp(1000);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session =
        offline_session_in_mode((1, 1), None, Some(&play), 1.0, ThresholdMode::PerBuffer);
    let output = run_blocks(&mut session, &[], 1, 1, 1200);

    assert!(signals_approx_equal(&output[..1000], &source, FLOAT_EPSILON));
    assert_silence(&output[1000..], SILENCE_THRESHOLD);

    let ended = drain_events(&session)
        .iter()
        .filter(|e| **e == DuplexEvent::PlaybackEnded)
        .count();
    assert_eq!(ended, 1);
    assert_eq!(session.stats().underruns, 0);
}

/// Captured frames land in the record file unchanged; a second session
/// plays that file back to the same samples.
#[test]
fn test_record_then_playback_round_trip() {
    let dir = tempdir().unwrap();
    let take = temp_wav(&dir, "take.wav");
    let record_frames = small_buffers().record_frames;

    // One frame past four halves forces the fourth flip.
    let captured = generate_sine(440.0, TEST_SAMPLE_RATE, 4 * record_frames + 1);
    {
        let mut session = offline_session((1, 1), Some(&take), None, 1.0);
        run_blocks(&mut session, &captured, 1, 1, captured.len());
        session.finish();
        assert_eq!(session.stats().frames_written, 4 * record_frames as u64);
        assert_eq!(session.stats().overruns, 0);
    }

    let (recorded, channels) = read_wav(&take);
    assert_eq!(channels, 1);
    assert_eq!(recorded.len(), 4 * record_frames);
    assert!(signals_approx_equal(
        &recorded,
        &captured[..4 * record_frames],
        FLOAT_EPSILON
    ));

    let mut session = offline_session((1, 1), None, Some(&take), 1.0);
    let played = run_blocks(&mut session, &[], 1, 1, recorded.len());
    assert!(signals_approx_equal(&played, &recorded, FLOAT_EPSILON));
}

/// Stereo in, stereo out: channel order survives both directions.
#[test]
fn test_stereo_round_trip_keeps_channel_order() {
    let dir = tempdir().unwrap();
    let take = temp_wav(&dir, "stereo.wav");
    let record_frames = small_buffers().record_frames;
    let captured = interleave_with_offset(&generate_ramp(2 * record_frames + 1), 2, -0.5);

    {
        let mut session = offline_session((2, 2), Some(&take), None, 1.0);
        run_blocks(&mut session, &captured, 2, 2, 2 * record_frames + 1);
    }

    let (recorded, channels) = read_wav(&take);
    assert_eq!(channels, 2);
    assert_eq!(recorded.len(), 2 * record_frames * 2);
    assert!(signals_approx_equal(
        &recorded,
        &captured[..recorded.len()],
        FLOAT_EPSILON
    ));

    let mut session = offline_session((2, 2), None, Some(&take), 1.0);
    let played = run_blocks(&mut session, &[], 2, 2, 2 * record_frames);
    assert!(signals_approx_equal(&played, &recorded, FLOAT_EPSILON));
}

/// A file shorter than one fill plays exactly its own length; the
/// controller switches on the short count, not the buffer capacity.
#[test]
fn test_short_file_uses_actual_fill_length() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "short.wav");
    let source = generate_ramp(100);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session = offline_session((1, 1), None, Some(&play), 1.0);
    assert!(session.context().is_source_exhausted());
    assert_eq!(session.context().playback().last_len(), 100);

    let output = run_blocks(&mut session, &[], 1, 1, 300);
    assert!(signals_approx_equal(&output[..100], &source, FLOAT_EPSILON));
    assert_silence(&output[100..], SILENCE_THRESHOLD);
    assert!(session.is_playback_finished());
    assert_eq!(session.stats().frames_read, 100);
}

/// Mono file on a stereo device plays on both channels.
#[test]
fn test_mono_file_fills_every_output_channel() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "mono.wav");
    let source = generate_sine(220.0, TEST_SAMPLE_RATE, 512);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session = offline_session((1, 2), None, Some(&play), 1.0);
    let output = run_blocks(&mut session, &[], 1, 2, 512);

    for (frame, &expected) in output.chunks(2).zip(&source) {
        assert_abs_diff_eq!(frame[0], expected, epsilon = FLOAT_EPSILON);
        assert_abs_diff_eq!(frame[1], expected, epsilon = FLOAT_EPSILON);
    }
}

/// A missing playback file disables playback only; recording continues.
#[test]
fn test_missing_playback_file_keeps_recording() {
    let dir = tempdir().unwrap();
    let take = temp_wav(&dir, "take.wav");
    let missing = temp_wav(&dir, "does-not-exist.wav");
    let record_frames = small_buffers().record_frames;

    let captured = generate_sine(440.0, TEST_SAMPLE_RATE, 2 * record_frames + 1);
    let mut session = offline_session((1, 1), Some(&take), Some(&missing), 1.0);
    assert!(session.is_recording());
    assert!(!session.is_playing());

    let output = run_blocks(&mut session, &captured, 1, 1, captured.len());
    assert_silence(&output, SILENCE_THRESHOLD);
    session.finish();

    let (recorded, _) = read_wav(&take);
    assert_eq!(recorded.len(), 2 * record_frames);
    assert_has_audio(&recorded, 0.1);
}

/// A record file that cannot be created disables recording only.
#[test]
fn test_unwritable_record_path_keeps_playing() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "play.wav");
    let bad = dir.path().join("missing-dir").join("take.wav");
    let source = generate_sine(330.0, TEST_SAMPLE_RATE, 512);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session = offline_session((1, 1), Some(&bad), Some(&play), 1.0);
    assert!(!session.is_recording());
    assert!(session.is_playing());

    let output = run_blocks(&mut session, &source, 1, 1, 512);
    assert!(signals_approx_equal(&output, &source, FLOAT_EPSILON));
}

/// Short input blocks are recorded as silence for the missing frames.
#[test]
fn test_missing_input_frames_record_silence() {
    let dir = tempdir().unwrap();
    let take = temp_wav(&dir, "take.wav");
    let record_frames = small_buffers().record_frames;

    let mut session = offline_session((1, 1), Some(&take), None, 1.0);
    run_blocks(&mut session, &[], 1, 1, record_frames + 1);
    session.finish();

    let (recorded, _) = read_wav(&take);
    assert_eq!(recorded.len(), record_frames);
    assert_silence(&recorded, SILENCE_THRESHOLD);
}
