use super::tuning::ScrollTuning;

/// Result of resolving the player's horizontal motion against the scroll boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollStep {
    /// How far the world scrolled this tick; parallax layers shift by it.
    pub delta: f64,
    pub player_screen_x: f64,
    pub player_velocity_x: f64,
}

/// World camera: the scroll offset and its eased velocity.
///
/// The player moves freely on screen until reaching `left_boundary`; past it the
/// player is pinned and the world scrolls instead.
#[derive(Debug, Clone)]
pub struct ScrollState {
    tuning: ScrollTuning,
    offset: f64,
    velocity: f64,
}

impl ScrollState {
    pub fn new(tuning: ScrollTuning) -> Self {
        Self {
            tuning,
            offset: 0.0,
            velocity: 0.0,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.velocity = 0.0;
    }

    pub fn advance(
        &mut self,
        player_velocity_x: f64,
        player_screen_x: f64,
        left_boundary: f64,
    ) -> ScrollStep {
        let mut screen_x = player_screen_x;
        let mut velocity_x = player_velocity_x;
        if screen_x + velocity_x < 0.0 {
            screen_x = 0.0;
            velocity_x = 0.0;
        }

        let delta = if screen_x + velocity_x < left_boundary {
            screen_x += velocity_x;
            self.velocity = 0.0;
            0.0
        } else {
            let target = if screen_x >= left_boundary {
                velocity_x
            } else {
                0.0
            };
            self.ease_toward(target);
            screen_x = left_boundary;
            self.velocity
        };

        self.offset += self.velocity;
        ScrollStep {
            delta,
            player_screen_x: screen_x,
            player_velocity_x: velocity_x,
        }
    }

    fn ease_toward(&mut self, target: f64) {
        let ScrollTuning {
            acceleration,
            friction,
            snap_epsilon,
            ..
        } = self.tuning;

        if target == 0.0 {
            self.velocity *= friction;
            if self.velocity.abs() < snap_epsilon {
                self.velocity = 0.0;
            }
            return;
        }

        let diff = target - self.velocity;
        if diff.abs() < acceleration {
            self.velocity = target;
        } else {
            self.velocity += acceleration.copysign(diff);
        }
    }
}
