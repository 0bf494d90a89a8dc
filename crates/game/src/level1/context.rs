use castle_engine::AudioSink;
use rand::rngs::SmallRng;
use rand::Rng;

/// Per-tick services lent to creature updates.
pub struct TickContext<'a> {
    pub dt_ms: f64,
    pub rng: &'a mut SmallRng,
    pub audio: &'a mut dyn AudioSink,
}

impl<'a> TickContext<'a> {
    pub fn new(dt_ms: f64, rng: &'a mut SmallRng, audio: &'a mut dyn AudioSink) -> Self {
        Self { dt_ms, rng, audio }
    }
}

/// True with probability `p`; out-of-range probabilities are clamped.
pub(crate) fn chance(rng: &mut SmallRng, p: f64) -> bool {
    rng.random_bool(p.clamp(0.0, 1.0))
}

/// Whole-millisecond duration in `min..=max`.
pub(crate) fn roll_ms(rng: &mut SmallRng, min: u32, max: u32) -> f64 {
    rng.random_range(min..=max.max(min)) as f64
}

pub(crate) fn random_sign(rng: &mut SmallRng) -> f64 {
    if rng.random_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}
