//! Component E — Creators (spec.md 4.E): read-only views that turn a
//! converged Layer into an output product without mutating the Mapping
//! itself. Three creators: the final inpainted frame, a spatial-cost debug
//! map, and a scalar total-cost summary used for convergence logging and
//! tests.

mod cost_total;
mod inpainting;
mod spatial_cost_map;

pub use cost_total::{total_cost_float, total_cost_int};
pub use inpainting::{create_inpainted_frame_float, create_inpainted_frame_int};
pub use spatial_cost_map::{spatial_cost_map_float, spatial_cost_map_int};
