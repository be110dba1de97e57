pub mod relax;

#[derive(Debug, Clone)]
pub struct RelaxOptions {
    /// Exact number of relaxation steps. The simulation is frozen afterwards.
    pub iterations: usize,
    /// Fraction of velocity lost per step.
    pub velocity_decay: f64,
    /// Alpha reached after `iterations` steps (exponential cooling from 1.0).
    pub alpha_min: f64,
    pub node_radius: f64,
    /// Extra gap on top of `2 * node_radius` enforced by collision.
    pub collision_margin: f64,
    pub collision_strength: f64,
}

impl RelaxOptions {
    pub fn min_separation(&self) -> f64 {
        2.0 * self.node_radius + self.collision_margin
    }
}

impl Default for RelaxOptions {
    fn default() -> Self {
        Self {
            iterations: 300,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            node_radius: 6.0,
            collision_margin: 2.0,
            collision_strength: 0.7,
        }
    }
}
