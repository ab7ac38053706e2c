use criterion::{Criterion, black_box, criterion_group, criterion_main};
use neugif::neuquant::NeuQuant;
use neugif::{Dither, DitherMethod, Encoder, RgbFrame};

fn gradient(width: u32, height: u32) -> RgbFrame {
    let mut frame = RgbFrame::with_color(width, height, [0, 0, 0]);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width) as u8;
            let g = (y * 255 / height) as u8;
            frame.set_rgb(x, y, [r, g, 255 - r / 2]);
        }
    }
    frame
}

fn build_palette(crit: &mut Criterion) {
    let frame = gradient(100, 100);
    crit.bench_function("build_palette", |b| {
        b.iter(|| NeuQuant::new(black_box(frame.as_bytes()), 10).palette())
    });
}

fn encode_frame(crit: &mut Criterion) {
    let frame = gradient(100, 100);
    crit.bench_function("encode_frame", |b| {
        b.iter(|| {
            let mut enc = Encoder::new(Vec::with_capacity(32768))
                .into_step_enc(100, 100)
                .with_dither(Dither::from(DitherMethod::FloydSteinberg));
            enc.encode_frame(black_box(&frame)).unwrap();
            enc.finish().unwrap();
        })
    });
}

criterion_group!(benches, build_palette, encode_frame);
criterion_main!(benches);
