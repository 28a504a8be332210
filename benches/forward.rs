use std::sync::Arc;

use burn::backend::NdArray;
use burn_text_rnn::{
    cli::models::Model,
    models::ClassifierConfig,
    pipelines::text_classification::Batcher,
    text::{Vectorizer, VocabularyBuilder},
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn documents(n: usize) -> Vec<String> {
    let words = [
        "wonderful", "terrible", "film", "staff", "rude", "friendly", "boring", "great", "food",
        "service",
    ];

    (0..n)
        .map(|i| {
            (0..8 + i % 24)
                .map(|j| words[(i * 7 + j * 3) % words.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier_forward");

    let texts = documents(32);
    let vocab = VocabularyBuilder::new(100).build(&texts).unwrap();
    let labels = vec!["negative".to_string(), "positive".to_string()];

    let batcher = Batcher::<NdArray>::new(
        Vectorizer::new(Arc::new(vocab.clone())),
        &labels,
        Default::default(),
    );

    for model in [Model::Mean, Model::Rnn, Model::Lstm, Model::BiLstm] {
        let classifier = ClassifierConfig::new(vocab.len(), labels.len(), model.encoder())
            .init::<NdArray>(&Default::default())
            .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(model), &model, |b, _| {
            b.iter(|| {
                let input = batcher.infer_batch(black_box(&texts)).unwrap();
                classifier.infer(input)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_forward);
criterion_main!(benches);
