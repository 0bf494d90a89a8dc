use rand::rngs::SmallRng;
use rand::Rng;

use super::tuning::ScrollTuning;

pub const TILE_COUNT: usize = 3;

/// Background layers, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerId {
    FarFog,
    FarTrees,
    NearFog,
    Ground,
    NearTrees,
}

impl LayerId {
    pub const ALL: [LayerId; 5] = [
        LayerId::FarFog,
        LayerId::FarTrees,
        LayerId::NearFog,
        LayerId::Ground,
        LayerId::NearTrees,
    ];

    const fn index(self) -> usize {
        match self {
            LayerId::FarFog => 0,
            LayerId::FarTrees => 1,
            LayerId::NearFog => 2,
            LayerId::Ground => 3,
            LayerId::NearTrees => 4,
        }
    }

    fn divisor(self, tuning: &ScrollTuning) -> f64 {
        match self {
            LayerId::FarFog => tuning.far_fog_divisor,
            LayerId::FarTrees => tuning.far_trees_divisor,
            LayerId::NearFog => tuning.near_fog_divisor,
            LayerId::Ground => tuning.ground_divisor,
            LayerId::NearTrees => tuning.near_trees_divisor,
        }
    }
}

/// Pixel widths of the layer textures, indexed like [`LayerId::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerWidths(pub [f64; 5]);

impl LayerWidths {
    pub fn uniform(width: f64) -> Self {
        Self([width; 5])
    }

    pub fn get(&self, id: LayerId) -> f64 {
        self.0[id.index()]
    }

    pub fn set(&mut self, id: LayerId, width: f64) {
        self.0[id.index()] = width;
    }
}

/// One background texture repeated in `TILE_COUNT` side-by-side tiles.
#[derive(Debug, Clone)]
pub struct ParallaxLayer {
    id: LayerId,
    divisor: f64,
    width: f64,
    positions: [f64; TILE_COUNT],
}

impl ParallaxLayer {
    fn new(id: LayerId, divisor: f64, width: f64) -> Self {
        let mut layer = Self {
            id,
            divisor,
            width,
            positions: [0.0; TILE_COUNT],
        };
        layer.reset();
        layer
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn positions(&self) -> &[f64; TILE_COUNT] {
        &self.positions
    }

    fn reset(&mut self) {
        for (index, position) in self.positions.iter_mut().enumerate() {
            *position = index as f64 * self.width;
        }
    }

    /// Shifts every tile left by `amount` and wraps tiles that left the strip.
    fn shift(&mut self, amount: f64) {
        for position in &mut self.positions {
            *position -= amount;
        }
        self.wrap();
    }

    fn wrap(&mut self) {
        if self.width <= 0.0 {
            return;
        }
        let span = self.width * TILE_COUNT as f64;
        for position in &mut self.positions {
            while *position <= -self.width {
                *position += span;
            }
            while *position > span - self.width {
                *position -= span;
            }
        }
    }
}

/// Idle fog speed that eases toward a randomly re-picked target.
#[derive(Debug, Clone)]
pub struct FogDrift {
    speed: f64,
    target: f64,
}

impl FogDrift {
    fn new(tuning: &ScrollTuning, rng: &mut SmallRng) -> Self {
        Self {
            speed: tuning.fog_base_speed,
            target: pick_fog_target(tuning, rng),
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    fn advance(&mut self, tuning: &ScrollTuning, dt_ms: f64, rng: &mut SmallRng) {
        let diff = self.target - self.speed;
        if diff.abs() < tuning.fog_settle_window {
            self.target = pick_fog_target(tuning, rng);
            return;
        }
        let max_step = tuning.fog_easing_per_ms * dt_ms;
        if diff.abs() <= max_step {
            self.speed = self.target;
        } else {
            self.speed += max_step.copysign(diff);
        }
    }
}

fn pick_fog_target(tuning: &ScrollTuning, rng: &mut SmallRng) -> f64 {
    rng.random_range(tuning.fog_min_speed..=tuning.fog_max_speed)
}

/// Wrapping background layers plus the fog drift that moves them when idle.
#[derive(Debug, Clone)]
pub struct ParallaxField {
    tuning: ScrollTuning,
    layers: [ParallaxLayer; 5],
    fog: FogDrift,
}

impl ParallaxField {
    pub fn new(tuning: ScrollTuning, widths: LayerWidths, rng: &mut SmallRng) -> Self {
        let layers = LayerId::ALL
            .map(|id| ParallaxLayer::new(id, id.divisor(&tuning), widths.get(id)));
        Self {
            fog: FogDrift::new(&tuning, rng),
            tuning,
            layers,
        }
    }

    pub fn layer(&self, id: LayerId) -> &ParallaxLayer {
        &self.layers[id.index()]
    }

    pub fn layers(&self) -> &[ParallaxLayer; 5] {
        &self.layers
    }

    pub fn fog(&self) -> &FogDrift {
        &self.fog
    }

    pub fn reset(&mut self, rng: &mut SmallRng) {
        for layer in &mut self.layers {
            layer.reset();
        }
        self.fog = FogDrift::new(&self.tuning, rng);
    }

    /// Idle fog motion, independent of the player.
    pub fn drift_fog(&mut self, dt_ms: f64, rng: &mut SmallRng) {
        self.fog.advance(&self.tuning, dt_ms, rng);
        let speed = self.fog.speed();
        let far_speed = speed * self.tuning.far_fog_drift_ratio;
        self.layers[LayerId::NearFog.index()].shift(speed);
        self.layers[LayerId::FarFog.index()].shift(far_speed);
    }

    /// Shifts each layer by the scroll delta over its divisor, truncated to whole pixels.
    pub fn apply_scroll(&mut self, delta: f64) {
        if delta == 0.0 {
            return;
        }
        for layer in &mut self.layers {
            if layer.divisor == 0.0 {
                continue;
            }
            layer.shift((delta / layer.divisor).trunc());
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn field(width: f64) -> (ParallaxField, SmallRng) {
        let mut rng = SmallRng::seed_from_u64(7);
        let field =
            ParallaxField::new(ScrollTuning::default(), LayerWidths::uniform(width), &mut rng);
        (field, rng)
    }

    fn assert_wrapped(field: &ParallaxField) {
        for layer in field.layers() {
            for position in layer.positions() {
                assert!(
                    *position > -layer.width(),
                    "{:?} tile at {position} (width {})",
                    layer.id(),
                    layer.width()
                );
            }
        }
    }

    #[test]
    fn tiles_start_side_by_side() {
        let (field, _) = field(1000.0);
        assert_eq!(field.layer(LayerId::Ground).positions(), &[0.0, 1000.0, 2000.0]);
    }

    #[test]
    fn divisors_truncate_shift() {
        let (mut field, _) = field(1000.0);
        field.apply_scroll(3.0);
        assert_eq!(field.layer(LayerId::NearTrees).positions()[0], -3.0);
        assert_eq!(field.layer(LayerId::FarTrees).positions()[0], -1.0);
        assert_eq!(field.layer(LayerId::NearFog).positions()[0], -1.0);
        assert_eq!(field.layer(LayerId::FarFog).positions()[0], -3.0);

        field.apply_scroll(1.0);
        assert_eq!(field.layer(LayerId::FarTrees).positions()[0], -1.0);
        assert_eq!(field.layer(LayerId::FarFog).positions()[0], -4.0);
    }

    #[test]
    fn wrap_keeps_tiles_in_view_for_huge_deltas() {
        let (mut field, mut rng) = field(700.0);
        for delta in [6.0, 6.0, 12_345.0, 700.0, 1.0, 99_999.0] {
            field.apply_scroll(delta);
            field.drift_fog(33.0, &mut rng);
            assert_wrapped(&field);
        }
    }

    #[test]
    fn wrapped_tiles_keep_continuous_coverage() {
        let (mut field, _) = field(500.0);
        field.apply_scroll(1234.0);
        let mut positions = *field.layer(LayerId::Ground).positions();
        positions.sort_by(f64::total_cmp);
        assert_eq!(positions[1] - positions[0], 500.0);
        assert_eq!(positions[2] - positions[1], 500.0);
    }

    #[test]
    fn fog_drifts_with_zero_scroll() {
        let (mut field, mut rng) = field(1000.0);
        field.drift_fog(33.0, &mut rng);
        assert!(field.layer(LayerId::NearFog).positions()[0] < 0.0);
        assert!(field.layer(LayerId::FarFog).positions()[0] < 0.0);
        assert_eq!(field.layer(LayerId::NearTrees).positions()[0], 0.0);
    }

    #[test]
    fn fog_speed_eases_without_overshoot_and_repicks_when_settled() {
        let tuning = ScrollTuning::default();
        let mut rng = SmallRng::seed_from_u64(11);
        let mut fog = FogDrift {
            speed: 0.2,
            target: 0.35,
        };
        fog.advance(&tuning, 33.0, &mut rng);
        assert!((fog.speed() - (0.2 + 0.0005 * 33.0)).abs() < 1e-12);

        fog.advance(&tuning, 10_000.0, &mut rng);
        assert_eq!(fog.speed(), 0.35);

        fog.advance(&tuning, 33.0, &mut rng);
        assert_eq!(fog.speed(), 0.35);
        assert!((0.1..=0.4).contains(&fog.target()));
    }

    #[test]
    fn zero_width_layers_do_not_spin() {
        let (mut field, mut rng) = field(0.0);
        field.apply_scroll(50.0);
        field.drift_fog(33.0, &mut rng);
        assert_eq!(field.layer(LayerId::Ground).positions()[0], -50.0);
    }
}
