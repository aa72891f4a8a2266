//! simviz
//!
//! A lightweight, cross-platform viewer that mirrors a running simulation.
//! It polls a simulation host over HTTP for the scene topology, the binary
//! mesh and texture assets and per-frame pose updates, and keeps a
//! hierarchical scene graph in sync with them. The same code runs natively
//! (tokio) and in the browser (WASM); drawing the graph is left to whichever
//! renderer consumes [`data_structures::scene_graph::SceneGraph::render_leaves`].
//!
//! High-level modules
//! - `builder`: turns a scene description into a scene graph and name registry
//! - `config`: viewer configuration and behaviour flags
//! - `convert`: left-handed to right-handed coordinate conversion
//! - `data_structures`: transforms, bounds, wire types and the scene graph
//! - `pose`: re-projects world-frame pose updates into parent-local frames
//! - `resources`: fetches and decodes meshes, materials and textures
//! - `transport`: access to the simulation host
//! - `viewer`: the session object and its polling loops
//!

pub mod builder;
pub mod config;
pub mod convert;
pub mod data_structures;
pub mod pose;
pub mod resources;
pub mod transport;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use config::{RegistrationScope, ViewerConfig};
pub use viewer::{Viewer, run};
