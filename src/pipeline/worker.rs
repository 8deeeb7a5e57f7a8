//! Decode unit: runs queued frames through the plate scanner and decides
//! what each frame is worth reporting

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info};

use super::messages::{DecodeTask, FrameReport, Overlay, OverlayTag, ScanResult};
use crate::models::Plate;
use crate::scanner::PlateScanner;

/// Decode counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Frames taken off the decode queue
    pub frames_processed: u64,
    /// Frames where the puck was found
    pub frames_aligned: u64,
    /// Scan results sent
    pub results_emitted: u64,
    /// Overlays sent
    pub overlays_emitted: u64,
}

pub(crate) struct DecodeUnit {
    pub scanner: PlateScanner,
    pub tasks: Receiver<DecodeTask>,
    pub results: Sender<ScanResult>,
    pub overlays: Sender<Overlay>,
    pub reports: Sender<FrameReport>,
    pub no_puck_timeout: Duration,
}

/// What the previous frames left behind
#[derive(Default)]
struct EmitState {
    last_full: Option<Plate>,
    last_plate_id: Option<u64>,
    barcode_counter: usize,
    plate_frame_number: u64,
}

impl DecodeUnit {
    pub fn run(self) -> DecodeStats {
        let DecodeUnit {
            mut scanner,
            tasks,
            results,
            overlays,
            reports,
            no_puck_timeout,
        } = self;
        let mut stats = DecodeStats::default();
        let mut state = EmitState::default();
        let mut last_aligned = Instant::now();

        // Receivers may be dropped by the owner; sends are best effort
        let send_overlay = |overlay: Overlay, stats: &mut DecodeStats| {
            stats.overlays_emitted += 1;
            let _ = overlays.send(overlay);
        };

        while let Ok(DecodeTask::Frame { number, frame }) = tasks.recv() {
            let started = Instant::now();
            let (plate, diagnostic) = scanner.scan_next_frame(&frame);
            let duration = started.elapsed();
            stats.frames_processed += 1;

            match plate {
                Some(plate) if diagnostic.is_aligned => {
                    stats.frames_aligned += 1;
                    last_aligned = Instant::now();

                    let same_plate = state.last_plate_id == Some(plate.id());
                    state.plate_frame_number = if same_plate { state.plate_frame_number + 1 } else { 1 };

                    let already_scanned = state
                        .last_full
                        .as_ref()
                        .is_some_and(|full| full.has_slots_in_common(plate));

                    if already_scanned {
                        send_overlay(Overlay::message(OverlayTag::AlreadyScanned), &mut stats);
                    } else if plate.is_full_valid() {
                        info!(plate = plate.id(), frame = number, "plate fully read");
                        stats.results_emitted += 1;
                        let _ = results.send(ScanResult {
                            plate: plate.clone(),
                            image: frame.clone(),
                            frame_number: number,
                        });
                        state.last_full = Some(plate.clone());
                    } else if diagnostic.has_barcodes {
                        send_overlay(Overlay::highlight(plate), &mut stats);
                        if same_plate && state.barcode_counter < plate.num_valid_barcodes() {
                            stats.results_emitted += 1;
                            let _ = results.send(ScanResult {
                                plate: plate.clone(),
                                image: frame.clone(),
                                frame_number: number,
                            });
                        }
                    }

                    state.last_plate_id = Some(plate.id());
                    state.barcode_counter = plate.num_valid_barcodes();
                }
                _ => {
                    state.plate_frame_number = 0;
                    if last_aligned.elapsed() > no_puck_timeout {
                        send_overlay(Overlay::message(OverlayTag::NoPuckDetected), &mut stats);
                    }
                }
            }

            let report = FrameReport {
                frame_number: number,
                plate_frame_number: state.plate_frame_number,
                duration,
                diagnostic,
            };
            debug!(
                frame = report.frame_number,
                plate_frame = report.plate_frame_number,
                elapsed_ms = duration.as_secs_f64() * 1000.0,
                aligned = diagnostic.is_aligned,
                attempts = diagnostic.decode_attempts,
                decoded = diagnostic.newly_decoded,
                "frame scanned"
            );
            let _ = reports.send(report);
        }

        debug!(?stats, "decode unit finished");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::models::Frame;
    use crate::testing::PuckScene;
    use std::sync::Arc;

    struct Harness {
        tasks: Sender<DecodeTask>,
        results: Receiver<ScanResult>,
        overlays: Receiver<Overlay>,
        reports: Receiver<FrameReport>,
        unit: DecodeUnit,
    }

    fn harness(no_puck_timeout: Duration) -> Harness {
        let (tasks, task_rx) = crossbeam_channel::unbounded();
        let (result_tx, results) = crossbeam_channel::unbounded();
        let (overlay_tx, overlays) = crossbeam_channel::unbounded();
        let (report_tx, reports) = crossbeam_channel::unbounded();
        let unit = DecodeUnit {
            scanner: PlateScanner::new(&ScanConfig::default()).unwrap(),
            tasks: task_rx,
            results: result_tx,
            overlays: overlay_tx,
            reports: report_tx,
            no_puck_timeout,
        };
        Harness {
            tasks,
            results,
            overlays,
            reports,
            unit,
        }
    }

    fn run(harness: Harness, frames: Vec<Frame>) -> (DecodeStats, Vec<ScanResult>, Vec<Overlay>, Vec<FrameReport>) {
        for (i, frame) in frames.into_iter().enumerate() {
            harness
                .tasks
                .send(DecodeTask::Frame {
                    number: i as u64 + 1,
                    frame: Arc::new(frame),
                })
                .unwrap();
        }
        harness.tasks.send(DecodeTask::Stop).unwrap();
        let stats = harness.unit.run();
        (
            stats,
            harness.results.try_iter().collect(),
            harness.overlays.try_iter().collect(),
            harness.reports.try_iter().collect(),
        )
    }

    #[test]
    fn test_full_plate_then_already_scanned() {
        let frame = PuckScene::unipuck(3).with_all_slots("S").render();
        let (stats, results, overlays, reports) =
            run(harness(Duration::from_secs(60)), vec![frame.clone(), frame]);

        assert_eq!(stats.frames_processed, 2);
        assert_eq!(results.len(), 1);
        assert!(results[0].plate.is_full_valid());
        assert_eq!(results[0].frame_number, 1);
        assert_eq!(overlays, vec![Overlay::message(OverlayTag::AlreadyScanned)]);
        assert_eq!(
            reports.iter().map(|r| r.plate_frame_number).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_partial_progress_emits_result() {
        let first = PuckScene::unipuck(3).with_all_slots("S").occlude_slot(3).occlude_slot(7);
        let second = first.clone().reveal_slot(3);
        let (_, results, overlays, _) = run(
            harness(Duration::from_secs(60)),
            vec![first.render(), second.render()],
        );

        // First frame: highlight only. Second: highlight plus the grown plate.
        assert_eq!(overlays.len(), 2);
        assert!(matches!(
            &overlays[0],
            Overlay::Highlight { tone_hz, .. } if *tone_hz == 10_000 * 2 / 16 + 37
        ));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].plate.num_valid_barcodes(), 15);
        assert_eq!(results[0].frame_number, 2);
    }

    #[test]
    fn test_no_puck_message_after_timeout() {
        let blank = Frame::from_gray(vec![0; 32 * 32], 32, 32).unwrap();
        let (stats, results, overlays, reports) =
            run(harness(Duration::ZERO), vec![blank.clone(), blank]);

        assert_eq!(stats.frames_aligned, 0);
        assert!(results.is_empty());
        assert_eq!(overlays, vec![Overlay::message(OverlayTag::NoPuckDetected); 2]);
        assert!(reports.iter().all(|r| r.plate_frame_number == 0));
    }

    #[test]
    fn test_no_message_before_timeout() {
        let blank = Frame::from_gray(vec![0; 32 * 32], 32, 32).unwrap();
        let (_, _, overlays, _) = run(harness(Duration::from_secs(60)), vec![blank]);
        assert!(overlays.is_empty());
    }

    #[test]
    fn test_stops_on_disconnect() {
        let h = harness(Duration::from_secs(60));
        drop(h.tasks);
        let stats = h.unit.run();
        assert_eq!(stats, DecodeStats::default());
    }
}
