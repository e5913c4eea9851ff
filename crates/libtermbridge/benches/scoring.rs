use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use libtermbridge::{prelude::*, scoring};

fn composite(c: &mut Criterion) {
  c.bench_function("composite", |b| {
    b.iter(|| black_box(scoring::score(black_box("Vataja Jwara fever due to vata dosha"), black_box("Fever of other or unknown origin"))))
  });
}

fn find_best_matches(c: &mut Criterion) {
  let source = SourceCode::builder("SR11").display("Vataja Jwara").name_english("Fever due to vata dosha").build();
  let targets = std::iter::repeat(vec![
    TargetCode::builder("MG26").title("Fever of other or unknown origin").build(),
    TargetCode::builder("SM10").title("Gastro-intestinal disorders").synonyms(&["Digestive tract disorders"]).build(),
    TargetCode::builder("8A80").title("Headache disorders").definition("Disorders characterised by recurrent headache").build(),
  ])
  .take(100)
  .flatten()
  .collect::<Vec<_>>();

  let ranker = MatchRanker::default();

  c.bench_function("find_best_matches", |b| b.iter(|| black_box(ranker.find_best_matches(&source, &targets, DEFAULT_MAX_RESULTS))));
}

criterion_group!(benches, composite, find_best_matches);
criterion_main!(benches);
