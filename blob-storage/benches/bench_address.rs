use std::path::Path;
use blob_store::address_for;
use criterion::{black_box, criterion_group, criterion_main, Criterion};


fn address_for_benchmark(c: &mut Criterion) {
    let base = Path::new("/opt/video-downloader/videos");
    c.bench_function("address_for", |b| b.iter(|| {
        address_for(black_box(base), black_box("channeltest"), black_box("1234"))
    }));
}

criterion_group!(benches, address_for_benchmark);
criterion_main!(benches);
