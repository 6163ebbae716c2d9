// Progress tracker monotonicity, in isolation and across real runs.

mod common;

#[cfg(test)]
mod progress_tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use proptest::prelude::*;
    use tempfile::tempdir;

    use file2qr_core::config::ConverterConfig;
    use file2qr_core::pipeline::Converter;
    use file2qr_core::telemetry::{percent_of, ProgressTracker};

    use crate::common::{fast_config, random_bytes, write_input, ShuffleCodec};

    proptest! {
        #[test]
        fn out_of_order_records_never_regress(order in Just((1u64..=64).collect::<Vec<_>>()).prop_shuffle()) {
            let p = ProgressTracker::new();
            let mut last = 0u8;
            for i in order {
                p.record(i, 64);
                let now = p.get();
                prop_assert!(now >= last);
                last = now;
            }
            prop_assert_eq!(p.get(), 100);
        }

        #[test]
        fn percent_is_floor_and_capped(index in 0u64..10_000, total in 1u64..10_000) {
            let pct = percent_of(index, total);
            prop_assert!(pct <= 100);
            if index <= total {
                prop_assert_eq!(pct as u64, index * 100 / total);
            }
        }
    }

    #[test]
    fn concurrent_producers_keep_the_maximum() {
        let p = ProgressTracker::new();
        thread::scope(|s| {
            for t in 0..8u64 {
                let p = &p;
                s.spawn(move || {
                    for i in (t..400).step_by(8) {
                        p.record(i + 1, 400);
                    }
                });
            }
        });
        assert_eq!(p.get(), 100);
    }

    #[test]
    fn reset_starts_over() {
        let p = ProgressTracker::new();
        p.complete();
        assert!(p.is_complete());
        p.reset();
        assert_eq!(p.get(), 0);
        assert!(p.advance_to(10));
        assert!(!p.advance_to(5));
        assert_eq!(p.get(), 10);
    }

    #[test]
    fn failed_calls_still_reset_progress() {
        let tmp = tempdir().unwrap();
        let converter = Converter::with_codec(fast_config(), ShuffleCodec);
        let progress = ProgressTracker::new();

        progress.complete();
        assert!(converter.decode(tmp.path().join("missing"), tmp.path().join("out.bin"), &progress).is_err());
        assert_eq!(progress.get(), 0);

        progress.complete();
        assert!(converter.encode(tmp.path().join("missing.bin"), tmp.path().join("frames"), &progress).is_err());
        assert_eq!(progress.get(), 0);
    }

    /// Sample the tracker while a run is in flight.
    fn observe<F: FnOnce()>(progress: &ProgressTracker, run: F) -> Vec<u8> {
        let done = AtomicBool::new(false);
        let mut seen = Vec::new();
        thread::scope(|s| {
            let sampler = s.spawn(|| {
                let mut seen = Vec::new();
                while !done.load(Ordering::SeqCst) {
                    seen.push(progress.get());
                    thread::sleep(Duration::from_micros(200));
                }
                seen.push(progress.get());
                seen
            });
            run();
            done.store(true, Ordering::SeqCst);
            seen = sampler.join().unwrap();
        });
        seen
    }

    #[test]
    fn observed_progress_is_monotonic_and_ends_at_100() {
        let tmp = tempdir().unwrap();
        let input = write_input(tmp.path(), "input.bin", &random_bytes(60_000, 31));
        let frames = tmp.path().join("frames");
        let output = tmp.path().join("out.bin");

        let config = ConverterConfig { chunk_size: 600, max_parallel: 8, ..fast_config() };
        let converter = Converter::with_codec(config, ShuffleCodec);
        let progress = Arc::new(ProgressTracker::new());

        let enc_seen = observe(&progress, || {
            converter.encode(&input, &frames, &progress).unwrap();
        });
        let dec_seen = observe(&progress, || {
            converter.decode(&frames, &output, &progress).unwrap();
        });

        for seen in [&enc_seen, &dec_seen] {
            // The first sample may still show the previous run's 100 before reset.
            let run: Vec<u8> = seen.iter().copied().skip_while(|&v| v == 100).collect();
            assert!(run.windows(2).all(|w| w[0] <= w[1]), "progress regressed: {run:?}");
            assert_eq!(*seen.last().unwrap(), 100);
        }
    }
}
