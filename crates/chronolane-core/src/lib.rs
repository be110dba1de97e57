#![forbid(unsafe_code)]

//! Event model and configuration for the chronolane temporal layout engine.
//!
//! Design goals:
//! - immutable, index-addressed event input (the engine never mutates events)
//! - lenient input loading: per-event problems degrade to "missing data", never to an error
//! - typed, validated configuration with JSON deep-merge overrides

pub mod config;
pub mod error;
pub mod geom;
pub mod input;
pub mod model;
pub mod time;

pub use config::LayoutConfig;
pub use error::{Error, Result};
pub use input::{events_from_json_str, events_from_json_value};
pub use model::{Entity, Event, RealTime};
