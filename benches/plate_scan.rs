use criterion::{Criterion, black_box, criterion_group, criterion_main};
use puck_barcode::config::ScanConfig;
use puck_barcode::scanner::PlateScanner;
use puck_barcode::testing::PuckScene;

fn bench_first_frame_full_puck(c: &mut Criterion) {
    let frame = PuckScene::unipuck(3).with_all_slots("B").with_holder("HOLDER").render();
    let config = ScanConfig::default();
    c.bench_function("scan_first_frame_unipuck", |b| {
        b.iter(|| {
            let mut scanner = PlateScanner::new(&config).unwrap();
            scanner.scan_next_frame(black_box(&frame)).1
        })
    });
}

fn bench_follow_up_frame(c: &mut Criterion) {
    // Every slot already valid: only alignment runs
    let frame = PuckScene::unipuck(3).with_all_slots("B").with_holder("HOLDER").render();
    let mut scanner = PlateScanner::new(&ScanConfig::default()).unwrap();
    scanner.scan_next_frame(&frame);
    c.bench_function("scan_follow_up_frame_unipuck", |b| {
        b.iter(|| scanner.scan_next_frame(black_box(&frame)).1)
    });
}

fn bench_empty_frame(c: &mut Criterion) {
    let frame = PuckScene::unipuck(3).render();
    let mut scanner = PlateScanner::new(&ScanConfig::default()).unwrap();
    c.bench_function("scan_empty_puck", |b| {
        b.iter(|| scanner.scan_next_frame(black_box(&frame)).1)
    });
}

criterion_group!(
    benches,
    bench_first_frame_full_puck,
    bench_follow_up_frame,
    bench_empty_frame
);
criterion_main!(benches);
