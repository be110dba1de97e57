#![forbid(unsafe_code)]

//! Headless force relaxation for column layouts with a pinned vertical axis.
//!
//! `chronolane-force` is used by `chronolane-layout` to spread simultaneous entity mentions
//! horizontally. The relaxation is a pure function of its inputs: a fixed number of iterations,
//! no randomness, no state kept between calls.

pub mod algo;
pub mod error;
pub mod graph;

pub use algo::RelaxOptions;
pub use error::{Error, Result};
pub use graph::{Graph, LayoutResult, Link, LinkKind, Node, Point};

/// Headless layout entry point.
pub fn layout(graph: &Graph, opts: &RelaxOptions) -> Result<LayoutResult> {
    algo::relax::layout(graph, opts)
}
