//! The canvas graph viewer: camera, layered renderer, labels, controls,
//! search and PNG export.

mod camera;
mod component;
mod controls;
mod export;
mod label;
mod load;
mod render;
mod scene;
mod search;
mod state;

pub use component::GraphView;
