//! Viewer data structures: transforms, bounds, wire types and the scene graph.
//!
//! - `bounds` holds axis-aligned boxes used to recenter a scene
//! - `description` mirrors the JSON documents served by the simulation host
//! - `scene_graph` enables hierarchical scene organization
//! - `transform` holds per-node position, rotation and scale

pub mod bounds;
pub mod description;
pub mod scene_graph;
pub mod transform;
