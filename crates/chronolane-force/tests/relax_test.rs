use chronolane_force::{Error, Graph, Link, LinkKind, Node, RelaxOptions, layout};

fn column_node(id: &str, column_x: f64, y: f64, strength: f64) -> Node {
    Node {
        target_x: column_x,
        target_strength: strength,
        min_x: Some(column_x - 40.0),
        max_x: Some(column_x + 40.0),
        ..Node::new(id, column_x, y)
    }
}

#[test]
fn y_is_pinned_bit_for_bit() {
    let ys = [0.1, 0.1, 33.333_333_333, 33.333_333_333, 90.0];
    let g = Graph {
        nodes: ys
            .iter()
            .enumerate()
            .map(|(i, &y)| column_node(&format!("n{i}"), 100.0, y, 0.2))
            .collect(),
        links: vec![Link {
            a: 0,
            b: 1,
            kind: LinkKind::SameTime,
            weight: 0.5,
            distance: 14.0,
        }],
    };
    let out = layout(&g, &RelaxOptions::default()).expect("layout ok");
    assert_eq!(out.iterations, 300);
    for (p, y) in out.positions.iter().zip(ys) {
        assert_eq!(p.y.to_bits(), y.to_bits());
    }
}

#[test]
fn simultaneous_mentions_are_separated_and_stay_near_the_column() {
    let opts = RelaxOptions::default();
    let g = Graph {
        nodes: (0..3)
            .map(|i| column_node(&format!("n{i}"), 100.0, 50.0, 0.3))
            .collect(),
        links: vec![
            Link {
                a: 0,
                b: 1,
                kind: LinkKind::SameTime,
                weight: 0.3,
                distance: 14.0,
            },
            Link {
                a: 1,
                b: 2,
                kind: LinkKind::SameTime,
                weight: 0.3,
                distance: 14.0,
            },
        ],
    };
    let out = layout(&g, &opts).expect("layout ok");
    let mut xs: Vec<f64> = out.positions.iter().map(|p| p.x).collect();
    xs.sort_by(f64::total_cmp);
    for w in xs.windows(2) {
        assert!(
            w[1] - w[0] >= opts.min_separation() * 0.9,
            "nodes overlap: {xs:?}"
        );
    }
    let mean = xs.iter().sum::<f64>() / xs.len() as f64;
    assert!((mean - 100.0).abs() < 5.0, "drifted off column: {mean}");
    for x in xs {
        assert!((60.0..=140.0).contains(&x));
    }
}

#[test]
fn fixed_nodes_do_not_move() {
    let mut pinned = column_node("solo", 300.0, 10.0, 0.0);
    pinned.fixed = true;
    let g = Graph {
        nodes: vec![pinned, column_node("other", 302.0, 10.0, 0.0)],
        links: Vec::new(),
    };
    let out = layout(&g, &RelaxOptions::default()).expect("layout ok");
    assert_eq!(out.positions[0].x, 300.0);
    assert!(out.positions[1].x - 300.0 >= RelaxOptions::default().min_separation() * 0.9);
}

#[test]
fn relaxation_is_deterministic() {
    let g = Graph {
        nodes: (0..12)
            .map(|i| column_node(&format!("n{i}"), 100.0 + (i % 3) as f64 * 90.0, (i / 2) as f64 * 5.0, 0.2))
            .collect(),
        links: (0..11)
            .map(|i| Link {
                a: i,
                b: i + 1,
                kind: LinkKind::SameEntity,
                weight: 0.05,
                distance: 40.0,
            })
            .collect(),
    };
    let a = layout(&g, &RelaxOptions::default()).expect("layout ok");
    let b = layout(&g, &RelaxOptions::default()).expect("layout ok");
    assert_eq!(a.positions, b.positions);
}

#[test]
fn all_fixed_graph_skips_relaxation() {
    let mut n = Node::new("a", 1.0, 2.0);
    n.fixed = true;
    let out = layout(
        &Graph {
            nodes: vec![n],
            links: Vec::new(),
        },
        &RelaxOptions::default(),
    )
    .expect("layout ok");
    assert_eq!(out.iterations, 0);
    assert_eq!((out.positions[0].x, out.positions[0].y), (1.0, 2.0));
}

#[test]
fn invalid_graphs_are_rejected() {
    let g = Graph {
        nodes: vec![Node::new("a", 0.0, 0.0)],
        links: vec![Link {
            a: 0,
            b: 3,
            kind: LinkKind::SameEntity,
            weight: 1.0,
            distance: 1.0,
        }],
    };
    assert!(matches!(
        layout(&g, &RelaxOptions::default()),
        Err(Error::LinkOutOfRange { link: 0, node_count: 1 })
    ));

    let g = Graph {
        nodes: vec![Node::new("nan", f64::NAN, 0.0)],
        links: Vec::new(),
    };
    assert!(matches!(
        layout(&g, &RelaxOptions::default()),
        Err(Error::NonFiniteCoordinate { .. })
    ));
}

#[test]
fn index_lookup_resolves_ids() {
    let g = Graph {
        nodes: vec![Node::new("x", 0.0, 0.0), Node::new("y", 0.0, 0.0)],
        links: Vec::new(),
    };
    let idx = g.index_by_id();
    assert_eq!(idx.get("y"), Some(&1));
    assert_eq!(idx.get("z"), None);
}
