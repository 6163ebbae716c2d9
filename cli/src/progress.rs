//! Progress display: polls the shared tracker on a fixed tick and mirrors it into a bar.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, tick, Sender};
use crossbeam::select;
use file2qr_core::constants::{PROGRESS_COMPLETE, PROGRESS_POLL_INTERVAL};
use file2qr_core::telemetry::ProgressTracker;
use indicatif::{ProgressBar, ProgressStyle};

pub struct ProgressPoller {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressPoller {
    /// Start polling `tracker` once per interval until it reports completion or `finish` is called.
    pub fn start(label: &'static str, tracker: Arc<ProgressTracker>) -> Self {
        let bar = ProgressBar::new(u64::from(PROGRESS_COMPLETE));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:>7} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}%")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(label);

        let (stop, stopped) = bounded::<()>(1);
        let handle = thread::spawn(move || {
            let ticker = tick(PROGRESS_POLL_INTERVAL);
            loop {
                select! {
                    recv(ticker) -> _ => {
                        bar.set_position(u64::from(tracker.get()));
                        if tracker.is_complete() {
                            break;
                        }
                    }
                    recv(stopped) -> _ => break,
                }
            }
            let last = tracker.get();
            bar.set_position(u64::from(last));
            if last >= PROGRESS_COMPLETE {
                bar.finish();
            } else {
                bar.abandon();
            }
        });

        Self { stop, handle: Some(handle) }
    }

    /// Stop polling and render the final state.
    pub fn finish(mut self) {
        let _ = self.stop.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        let _ = self.stop.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
