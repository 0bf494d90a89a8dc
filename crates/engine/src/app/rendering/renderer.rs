use std::sync::Arc;

use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use winit::window::Window;

use super::{Canvas, Viewport};

const CLEAR_COLOR: [u8; 4] = [6, 8, 14, 255];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Pixels(#[from] pixels::Error),
    #[error("failed to resize surface: {0}")]
    Resize(#[from] pixels::TextureError),
    #[error("frame buffer is smaller than {width}x{height}")]
    FrameTooSmall { width: u32, height: u32 },
}

/// Presents a fixed logical-resolution buffer scaled onto the window surface.
pub struct Renderer {
    pixels: Pixels<'static>,
    logical: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>, logical: Viewport) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width.max(1), size.height.max(1), window);
        let pixels = Pixels::new(logical.width, logical.height, surface)?;
        Ok(Self { pixels, logical })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)?;
        Ok(())
    }

    pub fn logical_size(&self) -> Viewport {
        self.logical
    }

    /// Clears the buffer, lets `draw` fill it, then presents it.
    pub fn render_with(&mut self, draw: impl FnOnce(&mut Canvas<'_>)) -> Result<(), RenderError> {
        let Viewport { width, height } = self.logical;
        {
            let mut canvas = Canvas::new(self.pixels.frame_mut(), width, height)
                .ok_or(RenderError::FrameTooSmall { width, height })?;
            canvas.clear(CLEAR_COLOR);
            draw(&mut canvas);
        }
        self.pixels.render()?;
        Ok(())
    }
}
