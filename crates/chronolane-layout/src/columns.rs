//! Entity columns: one vertical track per entity, nodes pinned to narrative time and relaxed
//! horizontally, then routed into metro tracks.

use crate::Result;
use crate::model::{
    ColumnLayout, EntityColumnsLayout, LayoutPoint, NodeLayout, Placeholder, PlaceholderReason,
};
use crate::route::route;
use crate::scale::{AxisOrientation, NarrativeScale, narrative_ticks};
use crate::text::TextMeasurer;
use chronolane_core::Event;
use chronolane_core::config::{ForceConfig, LayoutConfig};
use chronolane_force::{Graph, Link, LinkKind, Node, RelaxOptions};
use indexmap::IndexMap;

#[derive(Debug)]
struct Column<'a> {
    name: &'a str,
    /// Positions into the event slice, ordered by narrative time then event index.
    mentions: Vec<usize>,
}

fn collect_columns(events: &[Event]) -> IndexMap<&str, Column<'_>> {
    let mut columns: IndexMap<&str, Column<'_>> = IndexMap::new();
    for (pos, event) in events.iter().enumerate() {
        for entity in &event.entities {
            let column = columns.entry(entity.id.as_str()).or_insert_with(|| Column {
                name: entity.name.as_str(),
                mentions: Vec::new(),
            });
            if column.mentions.last() != Some(&pos) {
                column.mentions.push(pos);
            }
        }
    }
    for column in columns.values_mut() {
        column.mentions.sort_by(|&a, &b| {
            events[a]
                .narrative_time
                .total_cmp(&events[b].narrative_time)
                .then(events[a].index.cmp(&events[b].index))
        });
    }
    columns
}

fn column_center(cfg: &LayoutConfig, i: usize) -> f64 {
    let i = i as f64;
    cfg.columns.width * (i + 0.5) + cfg.columns.gap * i
}

fn node_id(entity_id: &str, pos: usize) -> String {
    format!("{entity_id}@{pos}")
}

fn log2_strength(count: f64, base: f64, max: f64) -> f64 {
    if count <= 1.0 {
        return 0.0;
    }
    (count.log2() * base).min(max)
}

fn relax_options(cfg: &LayoutConfig) -> RelaxOptions {
    let f: &ForceConfig = &cfg.force;
    RelaxOptions {
        iterations: f.iterations,
        velocity_decay: f.velocity_decay,
        alpha_min: f.alpha_min,
        node_radius: cfg.nodes.radius,
        collision_margin: f.collision_margin,
        collision_strength: f.collision_strength,
    }
}

/// Builds the force graph: nodes per (entity, mention) in column order, then chain links within
/// each column and same-time links across columns.
fn build_graph(
    events: &[Event],
    columns: &IndexMap<&str, Column<'_>>,
    cfg: &LayoutConfig,
    scale: &NarrativeScale,
) -> Graph {
    let f = &cfg.force;
    let half_width = (cfg.columns.width / 2.0 - cfg.nodes.radius).max(0.0);

    let spread = relax_options(cfg).min_separation();

    let mut graph = Graph::default();
    // (column, position) of every node, parallel to `graph.nodes`.
    let mut owners: Vec<(usize, usize)> = Vec::new();
    for (col_idx, (&entity_id, column)) in columns.iter().enumerate() {
        let center = column_center(cfg, col_idx);
        let count = column.mentions.len();
        let strength = log2_strength(count as f64, f.x_force_base, f.x_force_max);
        let same_time = column
            .mentions
            .chunk_by(|&a, &b| events[a].narrative_time == events[b].narrative_time);
        for run in same_time {
            // Coincident mentions start side by side in index order so relaxation keeps it.
            let mid = (run.len() as f64 - 1.0) / 2.0;
            for (k, &pos) in run.iter().enumerate() {
                let y = scale.map(events[pos].narrative_time);
                let mut x = center + (k as f64 - mid) * spread;
                let mut node = Node::new(node_id(entity_id, pos), center, y);
                node.target_strength = strength;
                node.fixed = count == 1;
                if f.clamp_to_column {
                    node.min_x = Some(center - half_width);
                    node.max_x = Some(center + half_width);
                    x = x.clamp(center - half_width, center + half_width);
                }
                node.x = x;
                graph.nodes.push(node);
                owners.push((col_idx, pos));
            }
        }
    }

    let links = {
        let index = graph.index_by_id();
        let lookup = |entity_id: &str, pos: usize| {
            index.get(node_id(entity_id, pos).as_str()).copied()
        };
        let mut links: Vec<Link> = Vec::new();

        for (&entity_id, column) in columns {
            for pair in column.mentions.windows(2) {
                let ends = (lookup(entity_id, pair[0]), lookup(entity_id, pair[1]));
                if let (Some(a), Some(b)) = ends {
                    links.push(Link {
                        a,
                        b,
                        kind: LinkKind::SameEntity,
                        weight: f.chain_strength,
                        distance: f.max_node_spacing,
                    });
                }
            }
        }

        let mut by_time: Vec<usize> = (0..graph.nodes.len()).collect();
        by_time.sort_by(|&a, &b| {
            let ta = events[owners[a].1].narrative_time;
            let tb = events[owners[b].1].narrative_time;
            ta.total_cmp(&tb).then(a.cmp(&b))
        });
        for (k, &a) in by_time.iter().enumerate() {
            let ta = events[owners[a].1].narrative_time;
            for &b in &by_time[k + 1..] {
                if events[owners[b].1].narrative_time - ta >= f.time_epsilon {
                    break;
                }
                let (col_a, col_b) = (owners[a].0, owners[b].0);
                if col_a == col_b {
                    continue;
                }
                let counts = columns[col_a].mentions.len() + columns[col_b].mentions.len();
                let avg = counts as f64 / 2.0;
                let weight = log2_strength(avg, f.horizontal_link_base, f.horizontal_link_max);
                if weight > 0.0 {
                    links.push(Link {
                        a,
                        b,
                        kind: LinkKind::SameTime,
                        weight,
                        distance: f.min_node_spacing,
                    });
                }
            }
        }
        links
    };
    graph.links = links;
    graph
}

/// Reorders each run of nodes sharing a row so the track crosses the row in one direction,
/// starting from the end nearer the previous row.
fn order_same_time_runs(nodes: &mut [NodeLayout]) {
    let mut start = 0;
    while start < nodes.len() {
        let y = nodes[start].y;
        let len = nodes[start..].iter().take_while(|n| n.y == y).count();
        let run = &mut nodes[start..start + len];
        run.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.event_index.cmp(&b.event_index)));
        if let (Some(prev), Some(first), Some(last)) = (
            start.checked_sub(1).map(|i| nodes[i].x),
            nodes.get(start).map(|n| n.x),
            nodes.get(start + len - 1).map(|n| n.x),
        ) {
            if (prev - last).abs() < (prev - first).abs() {
                nodes[start..start + len].reverse();
            }
        }
        start += len;
    }
}

/// Lays out every entity as a column of relaxed nodes joined by a routed track.
///
/// Events naming no entity are returned as placeholders in a trailing slot to the right of the
/// last column.
pub fn layout_entity_columns(
    events: &[Event],
    cfg: &LayoutConfig,
    measurer: &dyn TextMeasurer,
) -> Result<EntityColumnsLayout> {
    cfg.validate()?;

    let y_start = cfg.columns.padding_top;
    let y_end = (cfg.scale.height - cfg.columns.padding_bottom).max(y_start);
    let Some(scale) = NarrativeScale::from_events(events, y_start, y_end) else {
        return Ok(EntityColumnsLayout {
            columns: Vec::new(),
            placeholders: Vec::new(),
            ticks: Vec::new(),
            width: 0.0,
            height: cfg.scale.height,
        });
    };

    let columns = collect_columns(events);
    let graph = build_graph(events, &columns, cfg, &scale);
    let relaxed = chronolane_force::layout(&graph, &relax_options(cfg))?;

    let mut out_columns: Vec<ColumnLayout> = Vec::with_capacity(columns.len());
    let mut positions = relaxed.positions.iter();
    for (col_idx, (&entity_id, column)) in columns.iter().enumerate() {
        let mut nodes: Vec<NodeLayout> = Vec::with_capacity(column.mentions.len());
        for (&pos, p) in column.mentions.iter().zip(positions.by_ref()) {
            nodes.push(NodeLayout {
                event_index: events[pos].index,
                x: p.x,
                y: p.y,
            });
        }
        order_same_time_runs(&mut nodes);
        let points: Vec<LayoutPoint> = nodes.iter().map(|n| LayoutPoint::new(n.x, n.y)).collect();
        let path = route(&points, &cfg.route, true);
        out_columns.push(ColumnLayout {
            entity_id: entity_id.to_string(),
            name: column.name.to_string(),
            column_x: column_center(cfg, col_idx),
            path_d: path.to_svg_d(),
            path,
            nodes,
        });
    }

    let placeholder_x = column_center(cfg, columns.len());
    let placeholders: Vec<Placeholder> = events
        .iter()
        .filter(|e| e.entities.is_empty())
        .map(|e| {
            tracing::warn!(event = e.index, "event mentions no entity; placed as placeholder");
            Placeholder {
                event_index: e.index,
                x: placeholder_x,
                y: scale.map(e.narrative_time),
                reason: PlaceholderReason::MissingCategory,
            }
        })
        .collect();

    let slots = columns.len() + usize::from(!placeholders.is_empty());
    let width = if slots == 0 {
        0.0
    } else {
        slots as f64 * cfg.columns.width + (slots - 1) as f64 * cfg.columns.gap
    };

    tracing::debug!(
        events = events.len(),
        columns = out_columns.len(),
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        placeholders = placeholders.len(),
        iterations = relaxed.iterations,
        "entity columns laid out"
    );

    Ok(EntityColumnsLayout {
        columns: out_columns,
        placeholders,
        ticks: narrative_ticks(&scale, &cfg.scale, measurer, AxisOrientation::Vertical),
        width,
        height: cfg.scale.height,
    })
}
