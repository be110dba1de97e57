use crate::algo::RelaxOptions;
use crate::error::Result;
use crate::graph::{Graph, LayoutResult, Point};

pub fn layout(graph: &Graph, opts: &RelaxOptions) -> Result<LayoutResult> {
    graph.validate()?;

    let mut sim = SimGraph::from_graph(graph);
    let iterations = sim.run(opts);

    tracing::debug!(
        nodes = sim.nodes.len(),
        links = sim.links.len(),
        iterations,
        "force relaxation finished"
    );

    Ok(LayoutResult {
        positions: sim
            .nodes
            .iter()
            .map(|n| Point { x: n.x, y: n.y })
            .collect(),
        iterations,
    })
}

#[derive(Debug, Clone)]
struct SimNode {
    x: f64,
    y: f64,
    vx: f64,
    target_x: f64,
    target_strength: f64,
    fixed: bool,
    min_x: f64,
    max_x: f64,
}

#[derive(Debug, Clone, Copy)]
struct SimLink {
    a: usize,
    b: usize,
    strength: f64,
    distance: f64,
    // Share of the correction applied to `b`; the better-connected endpoint moves less.
    bias: f64,
}

#[derive(Debug, Clone)]
struct SimGraph {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    // Node indices sorted by pinned y; computed once since y never changes.
    by_y: Vec<usize>,
}

impl SimGraph {
    fn from_graph(graph: &Graph) -> Self {
        let nodes: Vec<SimNode> = graph
            .nodes
            .iter()
            .map(|n| {
                let min_x = n.min_x.unwrap_or(f64::NEG_INFINITY);
                let max_x = n.max_x.unwrap_or(f64::INFINITY).max(min_x);
                SimNode {
                    x: n.x,
                    y: n.y,
                    vx: 0.0,
                    target_x: n.target_x,
                    target_strength: if n.target_strength.is_finite() {
                        n.target_strength.max(0.0)
                    } else {
                        0.0
                    },
                    fixed: n.fixed,
                    min_x,
                    max_x,
                }
            })
            .collect();

        let mut degree: Vec<usize> = vec![0; nodes.len()];
        for l in &graph.links {
            if l.a == l.b {
                continue;
            }
            degree[l.a] += 1;
            degree[l.b] += 1;
        }

        let mut links: Vec<SimLink> = Vec::with_capacity(graph.links.len());
        for l in &graph.links {
            if l.a == l.b {
                continue;
            }
            let strength = if l.weight.is_finite() {
                l.weight.max(0.0)
            } else {
                0.0
            };
            if strength == 0.0 {
                continue;
            }
            let da = degree[l.a] as f64;
            let db = degree[l.b] as f64;
            links.push(SimLink {
                a: l.a,
                b: l.b,
                strength,
                distance: l.distance.max(0.0),
                bias: da / (da + db),
            });
        }

        let mut by_y: Vec<usize> = (0..nodes.len()).collect();
        by_y.sort_by(|&i, &j| nodes[i].y.total_cmp(&nodes[j].y).then(i.cmp(&j)));

        Self {
            nodes,
            links,
            by_y,
        }
    }

    fn run(&mut self, opts: &RelaxOptions) -> usize {
        if self.nodes.iter().all(|n| n.fixed) || opts.iterations == 0 {
            return 0;
        }

        let alpha_min = opts.alpha_min.clamp(1e-9, 0.999);
        let alpha_decay = 1.0 - alpha_min.powf(1.0 / opts.iterations as f64);
        let velocity_keep = 1.0 - opts.velocity_decay.clamp(0.0, 1.0);
        let min_sep = opts.min_separation().max(0.0);
        let collision_strength = opts.collision_strength.clamp(0.0, 1.0);

        let mut alpha = 1.0f64;
        for _ in 0..opts.iterations {
            alpha += -alpha * alpha_decay;

            self.apply_links(alpha);
            self.apply_column_attraction(alpha);
            if min_sep > 0.0 && collision_strength > 0.0 {
                self.apply_collisions(min_sep, collision_strength);
            }

            for n in &mut self.nodes {
                if n.fixed {
                    n.vx = 0.0;
                    continue;
                }
                n.vx *= velocity_keep;
                n.x += n.vx;
                if n.x < n.min_x {
                    n.x = n.min_x;
                    n.vx = 0.0;
                } else if n.x > n.max_x {
                    n.x = n.max_x;
                    n.vx = 0.0;
                }
            }
        }
        opts.iterations
    }

    fn apply_links(&mut self, alpha: f64) {
        for l in &self.links {
            let (a, b) = (&self.nodes[l.a], &self.nodes[l.b]);
            let dx = (b.x + b.vx) - (a.x + a.vx);
            let dy = b.y - a.y;
            let len = (dx * dx + dy * dy).sqrt();
            if len == 0.0 || dx == 0.0 {
                continue;
            }
            // Spring measured in 2D with y pinned: only the x component is applied.
            let k = (len - l.distance) / len * alpha * l.strength;
            let fx = dx * k;
            self.nodes[l.b].vx -= fx * l.bias;
            self.nodes[l.a].vx += fx * (1.0 - l.bias);
        }
    }

    fn apply_column_attraction(&mut self, alpha: f64) {
        for n in &mut self.nodes {
            if n.fixed || n.target_strength == 0.0 {
                continue;
            }
            n.vx += (n.target_x - n.x) * n.target_strength * alpha;
        }
    }

    fn apply_collisions(&mut self, min_sep: f64, strength: f64) {
        let min_sep_sq = min_sep * min_sep;
        for (pos, &i) in self.by_y.iter().enumerate() {
            for &j in &self.by_y[pos + 1..] {
                let dy = self.nodes[j].y - self.nodes[i].y;
                if dy >= min_sep {
                    break;
                }
                let (ni, nj) = (&self.nodes[i], &self.nodes[j]);
                if ni.fixed && nj.fixed {
                    continue;
                }
                let dx = (nj.x + nj.vx) - (ni.x + ni.vx);
                if dx * dx + dy * dy >= min_sep_sq {
                    continue;
                }
                let required = (min_sep_sq - dy * dy).sqrt();
                let overlap = required - dx.abs();
                if overlap <= 0.0 {
                    continue;
                }
                // Direction j moves in. Coincident nodes split by index: the lower index goes left.
                let dir = if dx > 0.0 {
                    1.0
                } else if dx < 0.0 {
                    -1.0
                } else if i < j {
                    1.0
                } else {
                    -1.0
                };
                let push = overlap * strength;
                match (ni.fixed, nj.fixed) {
                    (true, false) => self.nodes[j].vx += dir * push,
                    (false, true) => self.nodes[i].vx -= dir * push,
                    _ => {
                        self.nodes[j].vx += dir * push * 0.5;
                        self.nodes[i].vx -= dir * push * 0.5;
                    }
                }
            }
        }
    }
}
