//! Property tests: request bounds and buffer alternation.

use crate::helpers::*;
use proptest::prelude::*;
use tempfile::tempdir;
use varideck::prelude::*;
use varideck::stream::varispeed::{
    playback_request_frames, read_request_frames, record_request_frames,
};

proptest! {
    /// No valid ratio asks a fill for more frames than its staging holds.
    #[test]
    fn prop_requests_fit_staging(
        ratio in 0.125f64..=8.0,
        record_frames in 8usize..4096,
        playback_frames in 8usize..32768,
        chunk in 1usize..16384,
    ) {
        let buffers = BufferConfig {
            record_frames,
            playback_frames,
            read_chunk_frames: chunk,
            max_varispeed: 8.0,
            ..Default::default()
        };
        prop_assert!(record_request_frames(record_frames, ratio) <= buffers.record_resample_capacity_frames());
        prop_assert!(playback_request_frames(playback_frames, ratio) <= buffers.playback_capacity_frames());
        prop_assert!(read_request_frames(chunk, 1.0 / ratio) <= buffers.read_capacity_frames());
    }

    /// Playback fills never publish more frames than the play half holds,
    /// whatever the ratio.
    #[test]
    fn prop_playback_fill_within_half(ratio in 0.125f64..=8.0) {
        let dir = tempdir().unwrap();
        let play = temp_wav(&dir, "play.wav");
        write_wav(&play, &generate_ramp(3000), 1, TEST_SAMPLE_RATE);

        let mut session = offline_session((1, 1), None, Some(&play), ratio);
        let capacity = session.context().playback().capacity();
        for _ in 0..8 {
            run_blocks(&mut session, &[], 1, 1, TEST_BLOCK_FRAMES);
            let playback = session.context().playback();
            prop_assert!(playback.len(0) <= capacity);
            prop_assert!(playback.len(1) <= capacity);
        }
    }

    /// With drains keeping up, every flip gets exactly one drain, the
    /// active half alternates, and nothing overruns.
    #[test]
    fn prop_record_flips_alternate(blocks in proptest::collection::vec(1usize..=256, 1..40)) {
        let dir = tempdir().unwrap();
        let take = temp_wav(&dir, "take.wav");
        let record_frames = small_buffers().record_frames;

        let mut session = offline_session((1, 1), Some(&take), None, 1.0);
        let mut output = vec![0.0; 256];
        let mut total = 0usize;
        for &frames in &blocks {
            let input = vec![0.1; frames];
            session.process(&input, &mut output[..frames]);
            total += frames;
        }

        let record = session.context().record();
        let flips = (total.saturating_sub(1) / record_frames) as u64;
        prop_assert_eq!(record.flip_count(), flips);
        prop_assert_eq!(record.active_index() as u64, flips % 2);
        prop_assert_eq!(session.stats().record_fills, flips);
        prop_assert_eq!(session.stats().overruns, 0);
    }
}
