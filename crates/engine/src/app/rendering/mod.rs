mod canvas;
mod renderer;
mod transform;

pub use canvas::{BlitOptions, Canvas};
pub use renderer::{RenderError, Renderer};
pub use transform::{snap_px, world_to_screen_x, Viewport};
