use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use pprof::criterion::{Output, PProfProfiler};

use spikex_core::CountMatrix;
use spikex_render::HeatmapRenderer;

fn matrix(stimuli: usize, channels: usize) -> CountMatrix {
    let rows: Vec<Vec<u32>> = (0..stimuli)
        .map(|s| (0..channels).map(|c| ((s * 7 + c * 13) % 23) as u32).collect())
        .collect();
    CountMatrix::from_rows(&rows).unwrap_or_else(|_| CountMatrix::zeros(stimuli, channels))
}

pub fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("heatmap");
    group.sample_size(40);

    let renderer = HeatmapRenderer::default();
    for (label, stimuli) in [("short_trial", 20), ("long_trial", 400)] {
        let m = matrix(stimuli, 32);
        group.bench_function(label, |b| {
            b.iter_batched(
                || m.clone(),
                |m| black_box(renderer.render(&m)),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = bench_render
}
criterion_main!(benches);
