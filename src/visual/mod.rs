//! Colors, palettes, and the metric to visual attribute mapping.

pub mod color;
pub mod mapper;
pub mod palette;

pub use mapper::{DisplayGraph, NodeDisplay, ViewState, VisualMapper};
