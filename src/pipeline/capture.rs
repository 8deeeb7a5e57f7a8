//! Capture unit: reads frames, samples them onto the decode queue and
//! feeds the live view with the latest overlay

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, trace, warn};

use super::messages::{DecodeTask, Overlay};
use crate::error::CaptureError;
use crate::models::Frame;

const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// A camera or other supplier of frames
pub trait FrameSource: Send {
    /// Next frame; `CaptureError::Exhausted` ends the stream
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Free the device. Called exactly once, when the capture unit exits.
    fn release(&mut self) {}
}

/// What the live view wants after showing a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewControl {
    /// Keep capturing
    Continue,
    /// Shut the pipeline down
    Stop,
}

/// Display of the camera feed
pub trait LiveView: Send {
    /// Display `frame` with the most recent overlay, if any
    fn show(&mut self, frame: &Frame, overlay: Option<&Overlay>) -> ViewControl;
}

/// Cooperative stop signal shared between units
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Owns a frame source and releases it when dropped
pub struct SourceGuard {
    source: Box<dyn FrameSource>,
}

impl SourceGuard {
    /// Take ownership of `source`
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self { source }
    }

    /// Read from the guarded source
    pub fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        self.source.read_frame()
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.source.release();
    }
}

/// Capture counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Frames read from the source
    pub frames_read: u64,
    /// Frames put on the decode queue
    pub frames_queued: u64,
    /// Frames skipped by the sample-rate limit
    pub dropped_rate: u64,
    /// Frames dropped because the decode queue was full
    pub dropped_full: u64,
    /// Failed reads
    pub read_failures: u64,
    /// Longest decode queue observed
    pub max_queue_len: usize,
    /// The fallback source replaced the primary
    pub used_fallback: bool,
}

pub(crate) struct CaptureUnit {
    pub primary: Box<dyn FrameSource>,
    pub fallback: Option<Box<dyn FrameSource>>,
    pub view: Option<Box<dyn LiveView>>,
    pub tasks: Sender<DecodeTask>,
    pub overlays: Receiver<Overlay>,
    pub cancel: CancelToken,
    pub sample_interval: Duration,
}

impl CaptureUnit {
    pub fn run(self) -> CaptureStats {
        let CaptureUnit {
            primary,
            fallback,
            mut view,
            tasks,
            overlays,
            cancel,
            sample_interval,
        } = self;
        let mut stats = CaptureStats::default();

        let mut source = SourceGuard::new(primary);
        let mut pending = match source.read_frame() {
            Ok(frame) => Some(frame),
            Err(err) => {
                stats.read_failures += 1;
                match fallback {
                    Some(fallback) => {
                        warn!(%err, "primary source failed, switching to fallback");
                        // Dropping the old guard releases the primary
                        source = SourceGuard::new(fallback);
                        stats.used_fallback = true;
                    }
                    None => warn!(%err, "first frame read failed"),
                }
                None
            }
        };

        let mut latest_overlay: Option<Overlay> = None;
        let mut last_sample: Option<Instant> = None;
        let mut frame_number = 0u64;

        while !cancel.is_cancelled() {
            let frame = match pending.take().map(Ok).unwrap_or_else(|| source.read_frame()) {
                Ok(frame) => Arc::new(frame),
                Err(CaptureError::Exhausted) => {
                    debug!("frame source exhausted");
                    break;
                }
                Err(err) => {
                    stats.read_failures += 1;
                    warn!(%err, "frame read failed");
                    std::thread::sleep(READ_RETRY_DELAY);
                    continue;
                }
            };
            stats.frames_read += 1;
            frame_number += 1;

            if last_sample.is_some_and(|t| t.elapsed() < sample_interval) {
                stats.dropped_rate += 1;
            } else {
                let task = DecodeTask::Frame {
                    number: frame_number,
                    frame: Arc::clone(&frame),
                };
                match tasks.try_send(task) {
                    Ok(()) => {
                        stats.frames_queued += 1;
                        stats.max_queue_len = stats.max_queue_len.max(tasks.len());
                        last_sample = Some(Instant::now());
                    }
                    Err(TrySendError::Full(_)) => {
                        stats.dropped_full += 1;
                        trace!(frame_number, "decode queue full, frame dropped");
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        debug!("decode unit gone");
                        break;
                    }
                }
            }

            while let Ok(overlay) = overlays.try_recv() {
                latest_overlay = Some(overlay);
            }

            if let Some(view) = view.as_mut() {
                if view.show(&frame, latest_overlay.as_ref()) == ViewControl::Stop {
                    debug!("live view requested stop");
                    break;
                }
            }
        }

        // Blocks until the decode unit has room; fails only if it is gone
        let _ = tasks.send(DecodeTask::Stop);
        drop(source);
        debug!(?stats, "capture unit finished");
        stats
    }
}
