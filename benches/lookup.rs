use criterion::{black_box, criterion_group, criterion_main, Criterion};
use xtract::ExtractionFile;

#[path = "../tests/common/mod.rs"]
mod common;

use common::Fixture;

fn large_fixture(version: u32) -> Fixture {
    let mut fixture = Fixture::new(version)
        .field("pressure", 1, 80.0)
        .field("velocity", 3, 0.0)
        .field("shear", 1, -1.0);
    for site in 0..4096u32 {
        fixture = fixture.site([site % 64, site / 64, 0]);
    }
    for t in 0..32u64 {
        fixture = fixture.step_with(t * 100, |site, v| (site + v) as f64 * 0.5);
    }
    fixture
}

fn bench_open(c: &mut Criterion) {
    let file = large_fixture(4).write();

    c.bench_function("open_32_timesteps", |b| {
        b.iter(|| {
            let extraction = ExtractionFile::open(black_box(file.path())).unwrap();
            black_box(extraction.time_count());
        });
    });
}

fn bench_lookup(c: &mut Criterion) {
    for version in [3, 4] {
        let file = large_fixture(version).write();
        let extraction = ExtractionFile::open(file.path()).unwrap();

        c.bench_function(&format!("lookup_4096_sites_v{version}"), |b| {
            b.iter(|| {
                let record = extraction.lookup_by_time_step(black_box(1500)).unwrap();
                black_box(record.len());
            });
        });
    }
}

criterion_group!(benches, bench_open, bench_lookup);
criterion_main!(benches);
