use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use serial_link::port::{MockSerialPort, ReadTimeout, Resolution, SerialPort};
use std::time::Duration;

pub fn bench_buffered_read(c: &mut Criterion) {
    let payload: Vec<u8> = (0..4096).map(|i| (i % 251) as u8).collect();
    let mock = MockSerialPort::new();
    mock.set_read_chunk_limit(Some(64));
    let mut port = SerialPort::from_backend("BENCH0", Box::new(mock.clone()));

    c.bench_function("read_4k_in_64_byte_chunks", |b| {
        b.iter(|| {
            mock.enqueue_read(&payload);
            let data = port.read(payload.len()).unwrap();
            black_box(data);
        })
    });
}

pub fn bench_timeout_encoding(c: &mut Criterion) {
    c.bench_function("quantize_timeouts", |b| {
        b.iter(|| {
            for ms in [0u32, 1, 99, 250, 1000, 30_000] {
                let posix = ReadTimeout::with_resolution(ms, Resolution::Deciseconds);
                let windows = ReadTimeout::with_resolution(ms, Resolution::Milliseconds);
                black_box((posix.vtime(), windows.comm_timeouts()));
            }
        })
    });
}

criterion_group!{
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_buffered_read, bench_timeout_encoding
}
criterion_main!(benches);
