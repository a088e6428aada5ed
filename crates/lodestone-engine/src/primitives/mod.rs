//! Geometry producers that write into the shared buffers.

mod quad;

pub use quad::{quad_corners, quad_fan, Quad, QuadDesc, QuadVertices, QUAD_UVS};
