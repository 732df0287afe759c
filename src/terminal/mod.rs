//! Terminal: the in-place board renderer and the surface it draws on.

mod renderer;
mod surface;

pub use renderer::{RenderStats, Renderer, Throttle};
pub use surface::Surface;
