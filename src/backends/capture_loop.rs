// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for the capture loop
//!
//! The loop owns its state for the lifetime of the thread. When the loop
//! stops, either on request or because an iteration returned
//! [`LoopAction::Stop`], the exit closure runs on the capture thread and the
//! state is handed back to whoever joins.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by the capture loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Capture loop running on a dedicated thread
///
/// # Example
///
/// ```ignore
/// let mut capture = CaptureLoop::start(
///     "kinect-capture",
///     state,
///     |state| match state.driver.process_events(&mut state.publisher) {
///         Ok(_) => LoopAction::Continue,
///         Err(_) => LoopAction::Stop,
///     },
///     |state| state.teardown(),
/// )?;
///
/// // Later, stop the loop and take the state back
/// let state = capture.stop();
/// ```
pub struct CaptureLoop<S> {
    /// Thread handle; the thread returns the loop state
    thread_handle: Option<JoinHandle<S>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl<S: Send + 'static> CaptureLoop<S> {
    /// Spawn the loop thread
    ///
    /// `loop_fn` runs until it returns `LoopAction::Stop` or a stop is
    /// requested; `exit_fn` then runs once on the same thread.
    pub fn start<F, E>(name: &str, state: S, mut loop_fn: F, exit_fn: E) -> io::Result<Self>
    where
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
        E: FnOnce(&mut S) + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut state = state;
                debug!(name = %name_clone, "Capture loop thread started");

                loop {
                    if stop_signal_clone.load(Ordering::SeqCst) {
                        debug!(name = %name_clone, "Stop signal received");
                        break;
                    }

                    match loop_fn(&mut state) {
                        LoopAction::Continue => {}
                        LoopAction::Stop => {
                            debug!(name = %name_clone, "Loop requested stop");
                            break;
                        }
                    }
                }

                exit_fn(&mut state);
                info!(name = %name_clone, "Capture loop thread exiting");
                state
            })?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        })
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop, wait for the thread and take back the state
    pub fn stop(&mut self) -> Option<S> {
        self.request_stop();
        self.join()
    }

    /// Wait for the thread to finish without sending the stop signal
    ///
    /// Returns `None` if the thread was already joined or panicked.
    pub fn join(&mut self) -> Option<S> {
        let handle = self.thread_handle.take()?;
        debug!(name = %self.name, "Waiting for capture loop thread to finish");
        match handle.join() {
            Ok(state) => {
                debug!(name = %self.name, "Capture loop thread finished");
                Some(state)
            }
            Err(e) => {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
                None
            }
        }
    }
}

impl<S> Drop for CaptureLoop<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "CaptureLoop dropped, stopping loop");
            self.stop_signal.store(true, Ordering::SeqCst);
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_loop_stops_itself_and_returns_state() {
        let mut capture = CaptureLoop::start(
            "test-loop",
            0u32,
            |count| {
                *count += 1;
                if *count > 10 {
                    LoopAction::Stop
                } else {
                    LoopAction::Continue
                }
            },
            |_| {},
        )
        .unwrap();

        assert_eq!(capture.join(), Some(11));
        assert_eq!(capture.join(), None);
    }

    #[test]
    fn test_stop_signal() {
        let mut capture = CaptureLoop::start(
            "test-stop",
            0u32,
            |count| {
                *count += 1;
                thread::sleep(Duration::from_millis(5));
                LoopAction::Continue
            },
            |_| {},
        )
        .unwrap();

        thread::sleep(Duration::from_millis(30));
        let count = capture.stop().unwrap();
        assert!(count > 0);
        assert!(!capture.is_running());
    }

    #[test]
    fn test_exit_runs_on_capture_thread() {
        let mut capture = CaptureLoop::start(
            "test-exit",
            String::new(),
            |_| LoopAction::Stop,
            |name| {
                *name = thread::current().name().unwrap_or_default().to_string();
            },
        )
        .unwrap();

        assert_eq!(capture.join().as_deref(), Some("test-exit"));
    }

    #[test]
    fn test_exit_runs_after_requested_stop() {
        let exited = Arc::new(AtomicU32::new(0));
        let exited_clone = Arc::clone(&exited);

        let mut capture = CaptureLoop::start(
            "test-teardown",
            (),
            |_| {
                thread::sleep(Duration::from_millis(2));
                LoopAction::Continue
            },
            move |_| {
                exited_clone.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

        assert!(capture.is_running());
        capture.stop();
        assert_eq!(exited.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_stops_loop() {
        let exited = Arc::new(AtomicBool::new(false));
        let exited_clone = Arc::clone(&exited);

        let capture = CaptureLoop::start(
            "test-drop",
            (),
            |_| {
                thread::sleep(Duration::from_millis(2));
                LoopAction::Continue
            },
            move |_| exited_clone.store(true, Ordering::SeqCst),
        )
        .unwrap();

        drop(capture);
        assert!(exited.load(Ordering::SeqCst));
    }
}
