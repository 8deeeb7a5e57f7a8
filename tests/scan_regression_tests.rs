//! Multi-frame scanning regressions on synthetic puck frames
//!
//! These tests drive `PlateScanner` frame by frame and check that plates are
//! merged, restarted and completed the way a live camera feed needs.

use puck_barcode::config::ScanConfig;
use puck_barcode::models::SlotState;
use puck_barcode::scanner::PlateScanner;
use puck_barcode::testing::PuckScene;

fn scanner() -> PlateScanner {
    PlateScanner::new(&ScanConfig::default()).expect("default config is valid")
}

#[test]
fn full_puck_with_holder_in_one_frame() {
    let mut scanner = scanner();
    let frame = PuckScene::unipuck(3).with_all_slots("CPS").with_holder("ASP-0101").render();
    let (plate, diagnostic) = scanner.scan_next_frame(&frame);
    let plate = plate.expect("puck should align");

    assert!(diagnostic.is_aligned);
    assert!(diagnostic.has_barcodes);
    assert_eq!(diagnostic.newly_decoded, 17);
    assert!(plate.is_full_valid());
    assert_eq!(plate.holder().state.text(), Some("ASP-0101"));
    let expected: Vec<String> = (0..16).map(|i| format!("CPS{:02}", i)).collect();
    let barcodes: Vec<String> = plate.barcodes().into_iter().flatten().map(String::from).collect();
    assert_eq!(barcodes, expected);
}

#[test]
fn occluded_slot_completes_on_next_frame() {
    let mut scanner = scanner();
    let occluded = PuckScene::unipuck(3).with_all_slots("P").occlude_slot(6);

    let (plate, _) = scanner.scan_next_frame(&occluded.render());
    let plate = plate.expect("puck should align");
    assert!(!plate.is_full_valid());
    assert_eq!(plate.slots()[6].state, SlotState::NotFound);
    assert_eq!(plate.num_valid_barcodes(), 15);
    let first_id = plate.id();

    let revealed = occluded.reveal_slot(6);
    let (plate, diagnostic) = scanner.scan_next_frame(&revealed.render());
    let plate = plate.expect("puck should align");
    assert_eq!(plate.id(), first_id);
    assert!(plate.is_full_valid());
    assert_eq!(plate.slots()[6].state.text(), Some("P06"));
    assert_eq!(diagnostic.newly_decoded, 1);
    assert_eq!(plate.frames_merged(), 2);
}

#[test]
fn moved_puck_starts_fresh_plate() {
    let mut scanner = scanner();
    let scene = PuckScene::unipuck(3).with_all_slots("M").occlude_slot(0);
    let (plate, _) = scanner.scan_next_frame(&scene.render());
    let first_id = plate.expect("puck should align").id();

    let moved = scene.shifted(40.0, 0.0);
    let (plate, _) = scanner.scan_next_frame(&moved.render());
    let plate = plate.expect("moved puck should align");
    assert_ne!(plate.id(), first_id);
    assert_eq!(plate.frames_merged(), 1);
    assert_eq!(plate.num_valid_barcodes(), 15);
}

#[test]
fn small_jitter_keeps_plate() {
    let mut scanner = scanner();
    let scene = PuckScene::unipuck(3).with_all_slots("J").occlude_slot(0);
    let (plate, _) = scanner.scan_next_frame(&scene.render());
    let first_id = plate.expect("puck should align").id();

    let (plate, _) = scanner.scan_next_frame(&scene.shifted(5.0, 0.0).render());
    assert_eq!(plate.expect("puck should align").id(), first_id);
}

#[test]
fn valid_slots_are_sticky() {
    let mut scanner = scanner();
    let first = PuckScene::unipuck(3).with_all_slots("A").occlude_slot(3);
    scanner.scan_next_frame(&first.render());

    // Same position, different labels: valid slots keep what they read first
    let relabelled = PuckScene::unipuck(3).with_all_slots("B");
    let (plate, _) = scanner.scan_next_frame(&relabelled.render());
    let plate = plate.expect("puck should align");
    assert_eq!(plate.slots()[0].state.text(), Some("A00"));
    assert_eq!(plate.slots()[3].state.text(), Some("B03"));
    assert_eq!(plate.slots()[15].state.text(), Some("A15"));
}

#[test]
fn full_valid_is_monotonic() {
    let mut scanner = scanner();
    let base = PuckScene::unipuck(3).with_all_slots("N");
    let frames = [
        base.clone().occlude_slot(1).occlude_slot(2).occlude_slot(3),
        base.clone().occlude_slot(2).occlude_slot(3),
        base.clone().occlude_slot(3),
        base.clone(),
        base.clone().occlude_slot(1).occlude_slot(9),
    ];
    let expected = [false, false, false, true, true];

    let mut valid_counts = Vec::new();
    for (scene, full) in frames.iter().zip(expected) {
        let (plate, _) = scanner.scan_next_frame(&scene.render());
        let plate = plate.expect("puck should align");
        assert_eq!(plate.is_full_valid(), full);
        valid_counts.push(plate.num_valid_barcodes());
    }
    assert_eq!(valid_counts, vec![13, 14, 15, 16, 16]);
}

#[test]
fn damaged_symbols_are_corrected() {
    let mut scanner = scanner();
    let frame = PuckScene::unipuck(3).with_all_slots("D").with_damage(3).render();
    let (plate, _) = scanner.scan_next_frame(&frame);
    let plate = plate.expect("puck should align");
    assert!(plate.is_full_valid());
    assert_eq!(plate.slots()[7].state.text(), Some("D07"));
}

#[test]
fn rotated_symbols_decode() {
    for turns in 1..4 {
        let mut scanner = scanner();
        let frame = PuckScene::unipuck(3).with_all_slots("R").with_symbol_turns(turns).render();
        let (plate, _) = scanner.scan_next_frame(&frame);
        let plate = plate.expect("puck should align");
        assert!(plate.is_full_valid(), "quarter turns: {}", turns);
    }
}

#[test]
fn empty_puck_has_no_barcodes() {
    let mut scanner = scanner();
    let (plate, diagnostic) = scanner.scan_next_frame(&PuckScene::unipuck(3).render());
    let plate = plate.expect("bare puck still aligns");
    assert!(!diagnostic.has_barcodes);
    assert_eq!(diagnostic.decode_attempts, 0);
    assert!(plate.slots().iter().all(|s| s.state == SlotState::Empty));
}
