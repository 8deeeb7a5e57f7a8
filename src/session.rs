//! Side/top camera workflow
//!
//! A scan starts with the side camera reading the holder barcode. A new
//! holder switches the session to the top camera, whose results fill in
//! the pin barcodes until the plate is complete or the top scan times out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::models::{Frame, Plate};
use crate::pipeline::{OverlayTag, ScanResult};

/// Grace period before side-camera messages are surfaced
pub const MESSAGE_GRACE: Duration = Duration::from_secs(2);

/// Which camera the session is reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPhase {
    /// Waiting for a holder barcode
    Side,
    /// Reading the pins of the recorded holder
    Top,
}

/// One holder and what was read of its pins
#[derive(Debug, Clone)]
pub struct ScanRecord {
    /// Barcode read by the side camera
    pub holder_barcode: String,
    /// Side camera frame the holder was read from
    pub holder_image: Arc<Frame>,
    /// Latest top camera plate
    pub plate: Option<Plate>,
    /// Top camera frame of `plate`
    pub pins_image: Option<Arc<Frame>>,
}

/// Something the user interface should act on
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// New holder read; the top camera takes over
    PuckRecorded {
        /// Holder barcode
        holder_barcode: String,
    },
    /// The top camera made progress on the current record
    RecordUpdated(ScanRecord),
    /// All pins read
    ScanCompleted {
        /// Finished record
        record: ScanRecord,
        /// Time spent in the top phase
        elapsed: Duration,
    },
    /// The top camera gave up; back to the side camera
    ScanTimeout {
        /// Holder whose pins were not all read
        holder_barcode: String,
    },
    /// Side camera message that outlived the grace period
    Notice(OverlayTag),
}

/// Drives the camera switch from pipeline results
#[derive(Debug)]
pub struct ScanSession {
    phase: CameraPhase,
    top_scan_timeout: Duration,
    latest_holder: Option<String>,
    record: Option<ScanRecord>,
    top_started: Option<Instant>,
    message_timer: Option<Instant>,
}

impl ScanSession {
    /// Session in the side phase
    pub fn new(top_scan_timeout: Duration) -> Self {
        Self {
            phase: CameraPhase::Side,
            top_scan_timeout,
            latest_holder: None,
            record: None,
            top_started: None,
            message_timer: None,
        }
    }

    /// Camera currently in use
    pub fn phase(&self) -> CameraPhase {
        self.phase
    }

    /// Record being filled in, or the last finished one
    pub fn record(&self) -> Option<&ScanRecord> {
        self.record.as_ref()
    }

    /// Most recently recorded holder barcode
    pub fn latest_holder(&self) -> Option<&str> {
        self.latest_holder.as_deref()
    }

    /// Feed a result from whichever camera is active
    pub fn on_result(&mut self, result: &ScanResult) -> Option<SessionEvent> {
        self.on_result_at(result, Instant::now())
    }

    /// [`on_result`](Self::on_result) with an explicit clock
    pub fn on_result_at(&mut self, result: &ScanResult, now: Instant) -> Option<SessionEvent> {
        match self.phase {
            CameraPhase::Side => self.side_result(result, now),
            CameraPhase::Top => self.top_result(result, now),
        }
    }

    fn side_result(&mut self, result: &ScanResult, now: Instant) -> Option<SessionEvent> {
        if !result.plate.is_full_valid() {
            return None;
        }
        let holder = result.plate.barcodes().first().copied().flatten()?.to_string();
        if self.latest_holder.as_deref() == Some(holder.as_str()) {
            debug!(holder = %holder, "holder already recorded");
            return None;
        }

        info!(holder = %holder, "puck barcode recorded");
        self.latest_holder = Some(holder.clone());
        self.record = Some(ScanRecord {
            holder_barcode: holder.clone(),
            holder_image: Arc::clone(&result.image),
            plate: None,
            pins_image: None,
        });
        self.phase = CameraPhase::Top;
        self.top_started = Some(now);
        self.message_timer = None;
        Some(SessionEvent::PuckRecorded {
            holder_barcode: holder,
        })
    }

    fn top_result(&mut self, result: &ScanResult, now: Instant) -> Option<SessionEvent> {
        let record = self.record.as_mut()?;
        record.plate = Some(result.plate.clone());
        record.pins_image = Some(Arc::clone(&result.image));
        let record = record.clone();

        if !result.plate.is_full_valid() {
            return Some(SessionEvent::RecordUpdated(record));
        }

        let elapsed = self.top_started.map(|t| now.saturating_duration_since(t)).unwrap_or_default();
        info!(holder = %record.holder_barcode, elapsed_ms = elapsed.as_millis() as u64, "scan completed");
        self.back_to_side();
        Some(SessionEvent::ScanCompleted { record, elapsed })
    }

    /// Check the top scan deadline; call when no result is pending
    pub fn poll_timeout(&mut self) -> Option<SessionEvent> {
        self.poll_timeout_at(Instant::now())
    }

    /// [`poll_timeout`](Self::poll_timeout) with an explicit clock
    pub fn poll_timeout_at(&mut self, now: Instant) -> Option<SessionEvent> {
        if self.phase != CameraPhase::Top {
            return None;
        }
        let started = self.top_started?;
        if now.saturating_duration_since(started) <= self.top_scan_timeout {
            return None;
        }

        let holder_barcode = self
            .record
            .as_ref()
            .map(|r| r.holder_barcode.clone())
            .unwrap_or_default();
        warn!(holder = %holder_barcode, "top scan timed out");
        self.back_to_side();
        Some(SessionEvent::ScanTimeout { holder_barcode })
    }

    /// Feed an overlay message from the side camera
    ///
    /// The first message only starts the grace timer; an "already scanned"
    /// seen after the grace period means the side camera has nothing new,
    /// while "no puck" is surfaced at once and restarts the timer.
    pub fn on_message_at(&mut self, tag: OverlayTag, now: Instant) -> Option<SessionEvent> {
        if self.phase != CameraPhase::Side {
            self.message_timer = None;
            return None;
        }
        let Some(started) = self.message_timer else {
            self.message_timer = Some(now);
            return None;
        };
        match tag {
            OverlayTag::AlreadyScanned if now.saturating_duration_since(started) > MESSAGE_GRACE => {
                Some(SessionEvent::Notice(tag))
            }
            OverlayTag::NoPuckDetected => {
                self.message_timer = None;
                Some(SessionEvent::Notice(tag))
            }
            OverlayTag::AlreadyScanned => None,
        }
    }

    /// [`on_message_at`](Self::on_message_at) with the current time
    pub fn on_message(&mut self, tag: OverlayTag) -> Option<SessionEvent> {
        self.on_message_at(tag, Instant::now())
    }

    fn back_to_side(&mut self) {
        self.phase = CameraPhase::Side;
        self.top_started = None;
        self.message_timer = None;
    }
}
