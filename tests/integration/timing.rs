//! Late background fills: the real-time path keeps going and reports it.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use tempfile::tempdir;
use varideck::prelude::*;
use varideck::stream::FillTask;

/// The record drain never runs while two halves fill up: one overrun is
/// reported and rendering continues.
#[test]
fn test_record_overrun_is_reported_without_blocking() {
    let dir = tempdir().unwrap();
    let take = temp_wav(&dir, "take.wav");
    let record_frames = small_buffers().record_frames;

    let mut session = offline_session((1, 1), Some(&take), None, 1.0);
    let input = generate_sine(440.0, TEST_SAMPLE_RATE, 2 * record_frames + 1);
    let mut output = vec![0.0; input.len()];

    session.render_only(&input, &mut output);

    assert!(session.is_pending(FillTask::Record));
    assert_eq!(session.context().record().flip_count(), 2);
    assert_eq!(session.stats().overruns, 1);
    assert!(drain_events(&session).contains(&DuplexEvent::Overrun));

    // The late drain still writes one half and clears the flag.
    assert!(session.run_fill(FillTask::Record));
    assert!(!session.is_pending(FillTask::Record));
    assert!(!session.context().record().is_busy());
    assert_eq!(session.stats().frames_written, record_frames as u64);
}

/// A fill that keeps up never reports an overrun.
#[test]
fn test_timely_drains_never_overrun() {
    let dir = tempdir().unwrap();
    let take = temp_wav(&dir, "take.wav");
    let record_frames = small_buffers().record_frames;

    let mut session = offline_session((1, 1), Some(&take), None, 1.0);
    let input = generate_sine(440.0, TEST_SAMPLE_RATE, 8 * record_frames + 1);
    run_blocks(&mut session, &input, 1, 1, input.len());

    assert_eq!(session.stats().overruns, 0);
    assert_eq!(session.stats().record_fills, 8);
}

/// The playback refill is withheld past the end of the primed half: output
/// goes silent, one underrun is counted for the whole stall, and audio
/// resumes where it left off once the fill lands.
#[test]
fn test_playback_stall_counts_one_underrun_and_resumes() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "play.wav");
    let playback_frames = small_buffers().playback_frames;
    let source = generate_ramp(4 * playback_frames);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session = offline_session((1, 1), None, Some(&play), 1.0);

    let mut first = vec![0.0; playback_frames + 32];
    session.render_only(&[], &mut first);
    let mut second = vec![0.0; 32];
    session.render_only(&[], &mut second);

    assert!(signals_approx_equal(
        &first[..playback_frames],
        &source[..playback_frames],
        FLOAT_EPSILON
    ));
    assert_silence(&first[playback_frames..], SILENCE_THRESHOLD);
    assert_silence(&second, SILENCE_THRESHOLD);

    assert_eq!(session.stats().underruns, 1);
    let underruns = drain_events(&session)
        .into_iter()
        .filter(|e| *e == DuplexEvent::Underrun)
        .count();
    assert_eq!(underruns, 1);

    assert!(session.run_fill(FillTask::Playback));
    let resumed = run_blocks(&mut session, &[], 1, 1, 64);
    assert!(signals_approx_equal(
        &resumed,
        &source[playback_frames..playback_frames + 64],
        FLOAT_EPSILON
    ));
    assert_eq!(session.stats().underruns, 1);
    assert!(!session.is_playback_finished());
}

/// With fills run after every block, a long file plays without underruns
/// and every flip requests exactly one fill.
#[test]
fn test_timely_fills_never_underrun() {
    let dir = tempdir().unwrap();
    let play = temp_wav(&dir, "play.wav");
    let source = generate_sine(110.0, TEST_SAMPLE_RATE, 20 * small_buffers().playback_frames);
    write_wav(&play, &source, 1, TEST_SAMPLE_RATE);

    let mut session = offline_session((1, 1), None, Some(&play), 1.0);
    let output = run_blocks(&mut session, &[], 1, 1, source.len());

    assert!(signals_approx_equal(&output, &source, FLOAT_EPSILON));
    assert_eq!(session.stats().underruns, 0);

    let flips = session.context().playback().flip_count();
    assert_eq!(flips, 20);
    // Priming fill plus one per flip.
    assert_eq!(session.stats().playback_fills, flips + 1);
}
