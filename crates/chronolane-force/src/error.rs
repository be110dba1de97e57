#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("link {link} references a node outside 0..{node_count}")]
    LinkOutOfRange { link: usize, node_count: usize },
    #[error("node {node} has a non-finite coordinate")]
    NonFiniteCoordinate { node: String },
}

pub type Result<T> = std::result::Result<T, Error>;
