//! Two-thread scanning pipeline
//!
//! The capture unit samples frames onto a bounded decode queue and drops
//! frames when the queue is full; the decode unit owns the plate state and
//! emits results, overlays and per-frame reports on unbounded channels.
//!
//! ```text
//!  FrameSource ─► capture ──(bounded, try_send)──► decode ─► ScanResult
//!                   ▲                                 │  ─► FrameReport
//!                   └────────────── Overlay ◄─────────┘
//! ```

/// Frame sources and the capture unit
pub mod capture;
/// Types passed between the units and to the caller
pub mod messages;
/// The decode unit
pub mod worker;

use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use tracing::info;

pub use capture::{CancelToken, CaptureStats, FrameSource, LiveView, SourceGuard, ViewControl};
pub use messages::{progress_tone_hz, FrameReport, Overlay, OverlayTag, ScanResult, SlotHighlight};
pub use worker::DecodeStats;

use capture::CaptureUnit;
use worker::DecodeUnit;

use crate::config::ScanConfig;
use crate::detector::GeometryTemplate;
use crate::error::PipelineError;
use crate::scanner::PlateScanner;

/// Counters from both units after they finish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Capture unit counters
    pub capture: CaptureStats,
    /// Decode unit counters
    pub decode: DecodeStats,
}

/// Pipeline builder
pub struct Pipeline {
    config: ScanConfig,
    template: Option<GeometryTemplate>,
    source: Box<dyn FrameSource>,
    fallback: Option<Box<dyn FrameSource>>,
    view: Option<Box<dyn LiveView>>,
}

impl Pipeline {
    /// Pipeline reading from `source`
    pub fn new(source: impl FrameSource + 'static, config: ScanConfig) -> Self {
        Self {
            config,
            template: None,
            source: Box::new(source),
            fallback: None,
            view: None,
        }
    }

    /// Source used when the primary fails its first read
    pub fn with_fallback(mut self, fallback: impl FrameSource + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Show every captured frame with the latest overlay
    pub fn with_view(mut self, view: impl LiveView + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }

    /// Use `template` instead of the one named in the config
    pub fn with_template(mut self, template: GeometryTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Start both units
    pub fn spawn(self) -> Result<PipelineHandle, PipelineError> {
        let scanner = match self.template {
            Some(template) => PlateScanner::with_template(template, &self.config)?,
            None => PlateScanner::new(&self.config)?,
        };

        let (task_tx, task_rx) = crossbeam_channel::bounded(self.config.queue_depth.max(1));
        let (overlay_tx, overlay_rx) = crossbeam_channel::unbounded();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let (report_tx, report_rx) = crossbeam_channel::unbounded();
        let cancel = CancelToken::new();

        let decode = DecodeUnit {
            scanner,
            tasks: task_rx,
            results: result_tx,
            overlays: overlay_tx,
            reports: report_tx,
            no_puck_timeout: self.config.no_puck_timeout(),
        };
        let decode = thread::Builder::new()
            .name("puck-decode".into())
            .spawn(move || decode.run())
            .map_err(|source| PipelineError::Spawn { unit: "decode", source })?;

        // If this spawn fails the queue sender is dropped and decode exits
        let capture = CaptureUnit {
            primary: self.source,
            fallback: self.fallback,
            view: self.view,
            tasks: task_tx,
            overlays: overlay_rx,
            cancel: cancel.clone(),
            sample_interval: self.config.sample_interval(),
        };
        let capture = thread::Builder::new()
            .name("puck-capture".into())
            .spawn(move || capture.run())
            .map_err(|source| PipelineError::Spawn { unit: "capture", source })?;

        info!(
            template = %self.config.template,
            queue_depth = self.config.queue_depth.max(1),
            max_sample_rate = self.config.max_sample_rate,
            "pipeline started"
        );

        Ok(PipelineHandle {
            results: result_rx,
            reports: report_rx,
            cancel,
            capture,
            decode,
        })
    }
}

/// Running pipeline
pub struct PipelineHandle {
    results: Receiver<ScanResult>,
    reports: Receiver<FrameReport>,
    cancel: CancelToken,
    capture: JoinHandle<CaptureStats>,
    decode: JoinHandle<DecodeStats>,
}

impl PipelineHandle {
    /// Scan results; disconnects once the decode unit exits
    pub fn results(&self) -> &Receiver<ScanResult> {
        &self.results
    }

    /// Per-frame reports
    pub fn reports(&self) -> &Receiver<FrameReport> {
        &self.reports
    }

    /// Ask the capture unit to stop; the decode unit follows once the queue drains
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this pipeline
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for both units
    pub fn join(self) -> Result<PipelineStats, PipelineError> {
        let capture = self.capture.join();
        let decode = self.decode.join();
        let stats = PipelineStats {
            capture: capture.map_err(|_| PipelineError::UnitPanicked("capture"))?,
            decode: decode.map_err(|_| PipelineError::UnitPanicked("decode"))?,
        };
        info!(
            frames_read = stats.capture.frames_read,
            frames_queued = stats.capture.frames_queued,
            dropped = stats.capture.dropped_full + stats.capture.dropped_rate,
            results = stats.decode.results_emitted,
            "pipeline finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CaptureError, ConfigError};
    use crate::models::Frame;
    use crate::testing::{PuckScene, SyntheticSource};

    struct Failing;

    impl FrameSource for Failing {
        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            Err(CaptureError::Unavailable("no camera".into()))
        }
    }

    fn config() -> ScanConfig {
        ScanConfig {
            max_sample_rate: 0.0,
            queue_depth: 4,
            ..ScanConfig::default()
        }
    }

    #[test]
    fn test_full_puck_through_pipeline() {
        let scene = PuckScene::unipuck(3).with_all_slots("Q");
        let source = SyntheticSource::new(vec![scene]);
        let handle = Pipeline::new(source, config()).spawn().unwrap();
        let results: Vec<ScanResult> = handle.results().iter().collect();
        let stats = handle.join().unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].plate.barcodes()[0], Some("Q00"));
        assert_eq!(stats.capture.frames_read, 1);
        assert_eq!(stats.decode.frames_processed, stats.capture.frames_queued);
    }

    #[test]
    fn test_fallback_source_used() {
        let scene = PuckScene::unipuck(3).with_all_slots("F");
        let handle = Pipeline::new(Failing, config())
            .with_fallback(SyntheticSource::new(vec![scene]))
            .spawn()
            .unwrap();
        let results: Vec<ScanResult> = handle.results().iter().collect();
        let stats = handle.join().unwrap();
        assert!(stats.capture.used_fallback);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_cancel_stops_endless_source() {
        let scene = PuckScene::unipuck(3).with_slot(0, "C");
        let handle = Pipeline::new(SyntheticSource::new(vec![scene]).repeating(), config())
            .spawn()
            .unwrap();
        // Wait until the decode unit has seen a frame
        let _ = handle.reports().recv();
        handle.cancel();
        let stats = handle.join().unwrap();
        assert!(stats.capture.frames_read >= 1);
        assert_eq!(stats.decode.frames_processed, stats.capture.frames_queued);
    }

    #[test]
    fn test_unknown_template_fails_before_spawn() {
        let config = ScanConfig {
            template: "missing".into(),
            ..config()
        };
        let err = Pipeline::new(Failing, config).spawn().err().unwrap();
        assert!(matches!(err, PipelineError::Config(ConfigError::UnknownTemplate(_))));
    }
}
