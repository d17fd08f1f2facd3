//! Benchmarks for the IAGA-2002 reader and the station-day estimator.
//!
//!   cargo bench --bench parse_iaga
//!   cargo bench --bench parse_iaga -- parse_iaga/full_day

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use magdecl::observatories::{iaga_reader::parse_iaga_str, station_day::estimate_station_day};
use magdecl::EpochMode;

/// One full day of minute data (1440 rows) with X/Y components.
fn full_day_file() -> String {
    let mut content = String::from(
        " Format                 IAGA-2002                                    |
 Station Name           Bench Station                                |
 IAGA Code              BEN                                          |
 Geodetic Latitude      48.265                                       |
 Geodetic Longitude     11.672                                       |
 Elevation              525                                          |
 # synthetic minute values                                           |
DATE       TIME         DOY     BENX      BENY      BENZ      BENF   |
",
    );
    for minute in 0..1440 {
        let (h, m) = (minute / 60, minute % 60);
        let x = 21_000.0 + (minute as f64 * 0.01).sin() * 15.0;
        let y = 1_600.0 + (minute as f64 * 0.02).cos() * 8.0;
        content.push_str(&format!(
            "2021-04-11 {h:02}:{m:02}:00.000 101     {x:.2}  {y:.2}  43850.00  48700.00\n"
        ));
    }
    content
}

fn bench_parse(c: &mut Criterion) {
    let content = full_day_file();
    let mut group = c.benchmark_group("parse_iaga");

    group.bench_function("full_day", |b| {
        b.iter(|| parse_iaga_str(black_box(&content)))
    });

    let file = match parse_iaga_str(&content) {
        Ok(file) => file,
        Err(err) => panic!("benchmark fixture does not parse: {err}"),
    };
    group.bench_function("station_day", |b| {
        b.iter(|| estimate_station_day(black_box(&file), EpochMode::DayOfYear365))
    });

    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
