use chronolane_force::{Graph, Link, LinkKind, Node, RelaxOptions, layout};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

fn build_columns(entities: usize, mentions: usize) -> Graph {
    let mut g = Graph::default();
    for e in 0..entities {
        let column_x = 50.0 + e as f64 * 100.0;
        let first = g.nodes.len();
        for m in 0..mentions {
            // Pairs of mentions share a narrative time so collisions fire.
            let y = (m / 2) as f64 * 12.0;
            g.nodes.push(Node {
                target_x: column_x,
                target_strength: 0.3,
                min_x: Some(column_x - 40.0),
                max_x: Some(column_x + 40.0),
                ..Node::new(format!("e{e}@{m}"), column_x, y)
            });
            if m > 0 {
                g.links.push(Link {
                    a: first + m - 1,
                    b: first + m,
                    kind: LinkKind::SameEntity,
                    weight: 0.05,
                    distance: 40.0,
                });
            }
        }
    }
    g
}

fn bench_relax(c: &mut Criterion) {
    let mut group = c.benchmark_group("relax");
    group.measurement_time(Duration::from_secs(5));
    for &(entities, mentions) in &[(4usize, 16usize), (12, 40), (24, 80)] {
        let g = build_columns(entities, mentions);
        let opts = RelaxOptions::default();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{entities}x{mentions}")),
            &g,
            |b, g| b.iter(|| layout(black_box(g), black_box(&opts)).expect("layout ok")),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_relax);
criterion_main!(benches);
