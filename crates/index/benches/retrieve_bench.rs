use catalog::CatalogEntry;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use index::{retrieve, EmbeddingIndex};

const DIM: usize = 384;

fn synthetic_index(len: usize) -> EmbeddingIndex {
    let mut rng = seeded_unit_rng();
    let entries = (0..len)
        .map(|i| CatalogEntry::new(format!("drug-{i}"), "condition", "side effects"))
        .collect();
    let vectors = (0..len)
        .map(|_| (0..DIM).map(|_| rng() - 0.5).collect())
        .collect();
    let texts = (0..len).map(|i| format!("drug-{i} condition side effects")).collect();
    EmbeddingIndex::new("bench", entries, vectors, texts).expect("index")
}

/// Small xorshift generator so runs are comparable.
fn seeded_unit_rng() -> impl FnMut() -> f32 {
    let mut state: u32 = 0x9E37_79B9;
    move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state >> 8) as f32 / (1u32 << 24) as f32
    }
}

fn bench_retrieve(c: &mut Criterion) {
    let mut group = c.benchmark_group("retrieve");
    let query: Vec<f32> = (0..DIM).map(|i| (i as f32).sin()).collect();

    for len in [100, 1_000, 10_000].iter() {
        let index = synthetic_index(*len);
        group.throughput(Throughput::Elements(*len as u64));
        group.bench_function(format!("entries_{len}"), |b| {
            b.iter(|| retrieve(black_box(&query), black_box(&index), 10, 0.3).expect("retrieve"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_retrieve);
criterion_main!(benches);
