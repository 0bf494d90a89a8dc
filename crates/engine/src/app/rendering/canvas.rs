use crate::app::frames::Sprite;

use super::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitOptions {
    pub flip_x: bool,
    /// Whole-sprite opacity multiplied into each source pixel's alpha.
    pub opacity: u8,
}

impl Default for BlitOptions {
    fn default() -> Self {
        Self {
            flip_x: false,
            opacity: 255,
        }
    }
}

impl BlitOptions {
    pub fn flipped(flip_x: bool) -> Self {
        Self {
            flip_x,
            ..Self::default()
        }
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Drawable RGBA8 frame buffer borrowed for one render pass.
///
/// All drawing is clipped to the buffer; off-screen coordinates are not errors.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    /// Returns `None` when the buffer is smaller than `width * height` pixels.
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Option<Self> {
        let required = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if frame.len() < required {
            return None;
        }
        Some(Self {
            frame,
            width,
            height,
        })
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    /// Alpha-blended rectangle; the alpha channel of `color` is the blend weight.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: [u8; 4]) {
        let Some((left, top, right, bottom)) = self.clip(x, y, width, height) else {
            return;
        };
        for out_y in top..bottom {
            for out_x in left..right {
                let offset = self.offset(out_x, out_y);
                blend_pixel(&mut self.frame[offset..offset + 4], color, 255);
            }
        }
    }

    /// Draws `sprite` with its top-left corner at (`x`, `y`).
    pub fn blit(&mut self, sprite: &Sprite, x: i32, y: i32, options: BlitOptions) {
        if options.opacity == 0 || sprite.width() == 0 || sprite.height() == 0 {
            return;
        }
        let Some((left, top, right, bottom)) = self.clip(x, y, sprite.width(), sprite.height())
        else {
            return;
        };
        let sprite_width = sprite.width() as usize;
        let source = sprite.rgba();

        for out_y in top..bottom {
            let src_y = (out_y - y) as usize;
            for out_x in left..right {
                let local_x = (out_x - x) as usize;
                let src_x = if options.flip_x {
                    sprite_width - 1 - local_x
                } else {
                    local_x
                };
                let src_offset = (src_y * sprite_width + src_x) * 4;
                let color = [
                    source[src_offset],
                    source[src_offset + 1],
                    source[src_offset + 2],
                    source[src_offset + 3],
                ];
                if color[3] == 0 {
                    continue;
                }
                let dst_offset = self.offset(out_x, out_y);
                blend_pixel(
                    &mut self.frame[dst_offset..dst_offset + 4],
                    color,
                    options.opacity,
                );
            }
        }
    }

    fn clip(&self, x: i32, y: i32, width: u32, height: u32) -> Option<(i32, i32, i32, i32)> {
        let right = x.saturating_add(width.min(i32::MAX as u32) as i32);
        let bottom = y.saturating_add(height.min(i32::MAX as u32) as i32);
        let left = x.max(0);
        let top = y.max(0);
        let right = right.min(self.width as i32);
        let bottom = bottom.min(self.height as i32);
        (left < right && top < bottom).then_some((left, top, right, bottom))
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

fn blend_pixel(dst: &mut [u8], src: [u8; 4], opacity: u8) {
    let alpha = src[3] as u32 * opacity as u32 / 255;
    if alpha == 0 {
        return;
    }
    if alpha == 255 {
        dst[..3].copy_from_slice(&src[..3]);
        dst[3] = 255;
        return;
    }
    let inverse = 255 - alpha;
    for channel in 0..3 {
        dst[channel] = ((src[channel] as u32 * alpha + dst[channel] as u32 * inverse) / 255) as u8;
    }
    dst[3] = 255;
}
