#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Screen X of a world-space X for the current scroll offset.
pub fn world_to_screen_x(world_x: f64, scroll_offset: f64) -> f64 {
    world_x - scroll_offset
}

/// Pixel column for a sub-pixel position, truncating toward zero.
pub fn snap_px(value: f64) -> i32 {
    if value.is_finite() {
        value.trunc().clamp(i32::MIN as f64, i32::MAX as f64) as i32
    } else {
        0
    }
}
