use criterion::{Criterion, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};
use image_recon::fingerprint::hash_file;
use image_recon::shadows::{ShadowConfig, classify_shadows};
use std::hint::black_box;
use std::io::Write;

fn bench(c: &mut Criterion) {
    let image = DynamicImage::ImageLuma8(GrayImage::from_fn(1920, 1080, |x, y| {
        if (x + y) % 7 == 0 { Luma([30u8]) } else { Luma([180u8]) }
    }));
    let config = ShadowConfig::default();

    c.bench_function("shadows::classify_shadows 1080p", |b| {
        b.iter(|| classify_shadows(black_box(&image), black_box(config)));
    });

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&vec![0xA5u8; 4 * 1024 * 1024]).unwrap();
    file.flush().unwrap();

    c.bench_function("fingerprint::hash_file 4MiB", |b| {
        b.iter(|| hash_file(black_box(file.path())).unwrap());
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);
