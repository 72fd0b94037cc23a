use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use audioconv::audio::{float_to_pcm, BitDepth};
use audioconv::processing::{mix_channels, resample};
use audioconv::PcmBuffer;

const SECONDS: usize = 2;

fn tone(rate: u32, channels: u16) -> PcmBuffer {
    let frames = rate as usize * SECONDS;
    let samples: Vec<f32> = (0..frames * channels as usize)
        .map(|i| ((i / channels as usize) as f32 * 440.0 * std::f32::consts::TAU / rate as f32).sin() * 0.7)
        .collect();
    PcmBuffer::new(samples, rate, channels).unwrap()
}

fn bench_resample(c: &mut Criterion) {
    let input = tone(44100, 2);
    let mut group = c.benchmark_group("resample");
    group.throughput(Throughput::Elements(input.frames() as u64));

    for target in [22050u32, 48000, 96000] {
        group.bench_with_input(BenchmarkId::from_parameter(target), &target, |b, &target| {
            b.iter(|| resample(black_box(&input), target).unwrap())
        });
    }
    group.finish();
}

fn bench_mix(c: &mut Criterion) {
    let stereo = tone(48000, 2);
    let surround = tone(48000, 6);
    let mut group = c.benchmark_group("mix_channels");

    group.bench_function("2->1", |b| b.iter(|| mix_channels(black_box(&stereo), 1).unwrap()));
    group.bench_function("2->6", |b| b.iter(|| mix_channels(black_box(&stereo), 6).unwrap()));
    group.bench_function("6->2", |b| b.iter(|| mix_channels(black_box(&surround), 2).unwrap()));
    group.finish();
}

fn bench_quantize(c: &mut Criterion) {
    let input = tone(48000, 2);
    let mut group = c.benchmark_group("float_to_pcm");
    group.throughput(Throughput::Elements(input.samples().len() as u64));

    for depth in [BitDepth::U8, BitDepth::I16, BitDepth::I32] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| float_to_pcm(black_box(input.samples()), depth))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resample, bench_mix, bench_quantize);
criterion_main!(benches);
