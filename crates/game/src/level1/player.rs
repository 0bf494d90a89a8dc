use std::sync::Arc;

use castle_engine::{FrameSet, InputAction, InputSnapshot, Sprite, Viewport};
use tracing::info;

use crate::hero::HeroStats;

use super::tuning::PlayerTuning;

const FALLBACK_RECT_WIDTH: f64 = 50.0;

/// Receiver of creature damage. Implementations clamp hp at zero.
pub trait DamageSink {
    fn damage_player(&mut self, amount: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerInput {
    /// -1 left, 1 right, 0 neither.
    pub direction: i32,
    pub sprint: bool,
    pub jump: bool,
    pub debug_kill: bool,
}

impl PlayerInput {
    pub fn from_snapshot(input: &InputSnapshot) -> Self {
        Self {
            direction: input.horizontal_direction(),
            sprint: input.is_down(InputAction::Sprint),
            jump: input.is_down(InputAction::Jump),
            debug_kill: input.is_down(InputAction::DebugKill),
        }
    }
}

/// Right-facing hero animations; left-facing frames are drawn mirrored.
#[derive(Debug, Clone, Default)]
pub struct PlayerFrames {
    pub walk: Arc<FrameSet>,
    pub jump: Arc<FrameSet>,
    pub dead: Arc<FrameSet>,
}

impl PlayerFrames {
    pub fn placeholder(frame_count: usize, width: u32, height: u32) -> Self {
        let frames = || Arc::new(FrameSet::placeholder(frame_count, width, height));
        Self {
            walk: frames(),
            jump: frames(),
            dead: frames(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAnimation {
    Idle,
    Walk,
    Jump,
    Dead,
}

/// Screen-space layout derived from the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerGeometry {
    /// Top of the player rect when standing.
    pub base_y: f64,
    pub left_boundary: f64,
    /// Collision width used by creatures.
    pub width: f64,
    pub target_height: f64,
    pub rect_width: f64,
    pub rect_height: f64,
}

impl PlayerGeometry {
    pub fn new(tuning: &PlayerTuning, viewport: Viewport, walk: &FrameSet) -> Self {
        let screen_width = viewport.width as f64;
        let screen_height = viewport.height as f64;
        let base_height = (screen_height * tuning.base_height_ratio).trunc();
        let target_height = (base_height * tuning.sprite_scale).trunc();
        let base_y =
            (screen_height * tuning.ground_line_ratio).trunc() - (target_height - base_height);
        let (rect_width, rect_height) = if walk.is_empty() {
            (FALLBACK_RECT_WIDTH, target_height)
        } else {
            (walk.frame_width() as f64, walk.frame_height() as f64)
        };
        Self {
            base_y,
            left_boundary: (screen_width * tuning.left_boundary_ratio).trunc(),
            width: (screen_width * tuning.width_ratio).trunc(),
            target_height,
            rect_width,
            rect_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meter {
    current: f64,
    max: f64,
}

impl Meter {
    fn full(max: u32) -> Self {
        Self {
            current: max as f64,
            max: max as f64,
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn ratio(&self) -> f64 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    fn spend(&mut self, amount: f64) {
        self.current = (self.current - amount).max(0.0);
    }

    fn restore(&mut self, amount: f64) {
        self.current = (self.current + amount).min(self.max);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudBar {
    pub ratio: f64,
    pub color: [u8; 3],
}

/// The hero: input, vertical physics, stamina and animation.
///
/// Horizontal position is owned by the scroll resolution step; this type only
/// produces the velocity.
#[derive(Debug, Clone)]
pub struct PlayerController {
    tuning: PlayerTuning,
    geometry: PlayerGeometry,
    frames: PlayerFrames,
    x: f64,
    y: f64,
    velocity_x: f64,
    velocity_y: f64,
    on_ground: bool,
    facing_left: bool,
    hp: Meter,
    mana: Meter,
    stamina: Meter,
    stamina_idle_ms: f64,
    animation: PlayerAnimation,
    frame_index: usize,
    animation_timer_ms: f64,
    is_dead: bool,
    death_animation_done: bool,
}

impl PlayerController {
    pub fn new(
        hero: &HeroStats,
        viewport: Viewport,
        frames: PlayerFrames,
        tuning: PlayerTuning,
    ) -> Self {
        let geometry = PlayerGeometry::new(&tuning, viewport, &frames.walk);
        let mut player = Self {
            tuning,
            geometry,
            frames,
            x: 0.0,
            y: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
            on_ground: true,
            facing_left: false,
            hp: Meter::full(hero.hp),
            mana: Meter::full(hero.mana),
            stamina: Meter::full(hero.stamina),
            stamina_idle_ms: 0.0,
            animation: PlayerAnimation::Idle,
            frame_index: 0,
            animation_timer_ms: 0.0,
            is_dead: false,
            death_animation_done: false,
        };
        player.reset();
        player
    }

    /// Back to the spawn point, standing still. Stats are kept.
    pub fn reset(&mut self) {
        self.x = self.tuning.spawn_x;
        self.y = self.geometry.base_y;
        self.velocity_x = 0.0;
        self.velocity_y = 0.0;
        self.on_ground = true;
    }

    pub fn handle_input(&mut self, input: &PlayerInput, dt_ms: f64) {
        if self.is_dead {
            return;
        }
        if input.debug_kill {
            self.hp.current = 0.0;
        }

        let direction = input.direction.signum() as f64;
        let run_cost = self.tuning.run_cost_per_sec * dt_ms / 1000.0;
        let is_running = input.sprint && self.stamina.current >= run_cost;
        let multiplier = if is_running {
            self.tuning.sprint_multiplier
        } else {
            1.0
        };
        let acceleration = self.tuning.acceleration * multiplier;

        if is_running && direction != 0.0 {
            self.stamina.spend(run_cost);
            self.stamina_idle_ms = 0.0;
        }

        let target_speed = self.tuning.speed * multiplier * direction;
        let diff = target_speed - self.velocity_x;
        if diff.abs() < acceleration {
            self.velocity_x = target_speed;
        } else {
            self.velocity_x += acceleration.copysign(diff);
        }
        if direction == 0.0 {
            self.velocity_x *= self.tuning.friction;
            if self.velocity_x.abs() < self.tuning.stop_threshold {
                self.velocity_x = 0.0;
            }
        }

        if input.jump && self.on_ground && self.stamina.current >= self.tuning.jump_cost {
            self.velocity_y = self.tuning.jump_impulse;
            self.on_ground = false;
            self.stamina.spend(self.tuning.jump_cost);
            self.stamina_idle_ms = 0.0;
        }
    }

    pub fn update(&mut self, dt_ms: f64) {
        if self.hp.current <= 0.0 {
            self.update_dead(dt_ms);
            return;
        }

        self.velocity_y += self.tuning.gravity;
        self.y += self.velocity_y;
        if self.y >= self.geometry.base_y {
            self.y = self.geometry.base_y;
            self.velocity_y = 0.0;
            self.on_ground = true;
        }

        if self.velocity_x > 0.0 {
            self.facing_left = false;
        } else if self.velocity_x < 0.0 {
            self.facing_left = true;
        }

        self.animate(dt_ms);

        self.stamina_idle_ms += dt_ms;
        if self.stamina_idle_ms > self.tuning.regen_delay_ms {
            let regen = self.tuning.stamina_regen_per_sec * dt_ms / 1000.0;
            self.stamina.restore(regen);
        }
    }

    fn update_dead(&mut self, dt_ms: f64) {
        if !self.is_dead {
            self.is_dead = true;
            self.animation = PlayerAnimation::Dead;
            self.frame_index = 0;
            self.animation_timer_ms = 0.0;
            self.velocity_x = 0.0;
            self.velocity_y = 0.0;
            info!(x = self.x, y = self.y, "player_died");
        }

        let frame_count = self.frames.dead.len();
        if self.death_animation_done || frame_count == 0 {
            return;
        }
        self.animation_timer_ms += dt_ms;
        if self.animation_timer_ms < self.tuning.death_frame_ms {
            return;
        }
        self.animation_timer_ms -= self.tuning.death_frame_ms;
        self.frame_index += 1;
        if self.frame_index >= frame_count {
            self.frame_index = frame_count - 1;
            self.death_animation_done = true;
        } else {
            let nudge = if self.facing_left {
                -self.tuning.death_nudge_x
            } else {
                self.tuning.death_nudge_x
            };
            self.x += nudge;
            self.y += self.tuning.death_nudge_y;
        }
    }

    fn animate(&mut self, dt_ms: f64) {
        let jump_frames = self.frames.jump.len();
        if !self.on_ground && jump_frames > 0 {
            self.enter_animation(PlayerAnimation::Jump);
            if self.frame_index < jump_frames {
                self.animation_timer_ms += dt_ms;
                if self.animation_timer_ms >= self.tuning.jump_frame_ms {
                    self.animation_timer_ms = 0.0;
                    self.frame_index += 1;
                }
            }
        } else if self.velocity_x != 0.0 {
            self.enter_animation(PlayerAnimation::Walk);
            self.animation_timer_ms += dt_ms;
            if self.animation_timer_ms >= self.walk_frame_delay_ms() {
                self.animation_timer_ms = 0.0;
                self.frame_index = (self.frame_index + 1) % self.frames.walk.len().max(1);
            }
        } else {
            self.animation = PlayerAnimation::Idle;
        }
    }

    fn enter_animation(&mut self, animation: PlayerAnimation) {
        if self.animation != animation {
            self.animation = animation;
            self.frame_index = 0;
            self.animation_timer_ms = 0.0;
        }
    }

    /// Faster movement cycles the walk faster, never below the floor delay.
    pub fn walk_frame_delay_ms(&self) -> f64 {
        let speed_factor = self.velocity_x.abs() / self.tuning.speed;
        if speed_factor <= 0.0 {
            return f64::INFINITY;
        }
        (self.tuning.walk_frame_base_ms / speed_factor)
            .trunc()
            .max(self.tuning.walk_frame_floor_ms)
    }

    /// Applies the horizontal result of scroll resolution.
    pub fn set_horizontal(&mut self, screen_x: f64, velocity_x: f64) {
        self.x = screen_x;
        self.velocity_x = velocity_x;
    }

    pub fn current_sprite(&self) -> Option<&Sprite> {
        match self.animation {
            PlayerAnimation::Dead if !self.frames.dead.is_empty() => {
                self.frames.dead.frame(self.frame_index)
            }
            PlayerAnimation::Jump => self.frames.jump.frame(self.frame_index),
            PlayerAnimation::Walk => self.frames.walk.frame(self.frame_index),
            PlayerAnimation::Idle | PlayerAnimation::Dead => self.frames.walk.frame(0),
        }
    }

    pub fn hud_bars(&self) -> [HudBar; 3] {
        let hp = self.hp.ratio();
        let mana = self.mana.ratio();
        let stamina = self.stamina.ratio();
        [
            HudBar {
                ratio: hp,
                color: if hp > 0.6 {
                    [180, 40, 40]
                } else if hp > 0.3 {
                    [200, 140, 20]
                } else {
                    [180, 20, 20]
                },
            },
            HudBar {
                ratio: mana,
                color: [60, 60, (200.0 + 30.0 * mana) as u8],
            },
            HudBar {
                ratio: stamina,
                color: if stamina > 0.6 {
                    [60, 200, 60]
                } else if stamina > 0.3 {
                    [160, 160, 40]
                } else {
                    [140, 60, 20]
                },
            },
        ]
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn velocity_x(&self) -> f64 {
        self.velocity_x
    }

    pub fn velocity_y(&self) -> f64 {
        self.velocity_y
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn facing_left(&self) -> bool {
        self.facing_left
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn death_animation_done(&self) -> bool {
        self.death_animation_done
    }

    pub fn animation(&self) -> PlayerAnimation {
        self.animation
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn geometry(&self) -> &PlayerGeometry {
        &self.geometry
    }

    pub fn hp(&self) -> &Meter {
        &self.hp
    }

    pub fn mana(&self) -> &Meter {
        &self.mana
    }

    pub fn stamina(&self) -> &Meter {
        &self.stamina
    }
}

impl DamageSink for PlayerController {
    fn damage_player(&mut self, amount: u32) {
        self.hp.spend(amount as f64);
        info!(amount, hp = self.hp.current, "player_damaged");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hero::{load_hero_stats, save_hero};

    const TICK_MS: f64 = 1000.0 / 30.0;

    fn viewport() -> Viewport {
        Viewport {
            width: 1440,
            height: 900,
        }
    }

    fn player() -> PlayerController {
        PlayerController::new(
            &HeroStats::default(),
            viewport(),
            PlayerFrames::placeholder(4, 60, 270),
            PlayerTuning::default(),
        )
    }

    fn tick(player: &mut PlayerController, input: PlayerInput) {
        player.handle_input(&input, TICK_MS);
        player.update(TICK_MS);
    }

    #[test]
    fn geometry_follows_design_resolution() {
        let player = player();
        let geometry = player.geometry();
        assert_eq!(geometry.base_y, 540.0);
        assert_eq!(geometry.left_boundary, 576.0);
        assert_eq!(geometry.width, 72.0);
        assert_eq!((player.x(), player.y()), (100.0, 540.0));
    }

    #[test]
    fn jump_without_stamina_does_nothing() {
        let mut player = player();
        player.stamina.current = 10.0;
        player.handle_input(
            &PlayerInput {
                jump: true,
                ..PlayerInput::default()
            },
            TICK_MS,
        );
        assert_eq!(player.velocity_y(), 0.0);
        assert!(player.on_ground());
        assert_eq!(player.stamina().current(), 10.0);
    }

    #[test]
    fn jump_spends_stamina_and_lands_on_base_line() {
        let mut player = player();
        let jump = PlayerInput {
            jump: true,
            ..PlayerInput::default()
        };
        player.handle_input(&jump, TICK_MS);
        assert_eq!(player.velocity_y(), -18.0);
        assert!(!player.on_ground());
        assert_eq!(player.stamina().current(), 85.0);

        player.update(TICK_MS);
        assert_eq!(player.y(), 540.0 - 16.0);
        assert_eq!(player.animation(), PlayerAnimation::Jump);

        player.handle_input(&jump, TICK_MS);
        assert_eq!(player.stamina().current(), 85.0, "no jump mid-air");

        for _ in 0..40 {
            player.update(TICK_MS);
        }
        assert!(player.on_ground());
        assert_eq!(player.y(), 540.0);
        assert_eq!(player.velocity_y(), 0.0);
    }

    #[test]
    fn velocity_accelerates_and_decays_with_friction() {
        let mut player = player();
        let right = PlayerInput {
            direction: 1,
            ..PlayerInput::default()
        };
        player.handle_input(&right, TICK_MS);
        assert!((player.velocity_x() - 1.2).abs() < 1e-9);
        player.handle_input(&right, TICK_MS);
        player.handle_input(&right, TICK_MS);
        assert_eq!(player.velocity_x(), 3.0);

        let mut ticks = 0;
        while player.velocity_x() != 0.0 {
            player.handle_input(&PlayerInput::default(), TICK_MS);
            ticks += 1;
            assert!(ticks < 20);
        }
    }

    #[test]
    fn sprint_doubles_speed_and_drains_stamina_only_while_moving() {
        let mut player = player();
        let sprint_still = PlayerInput {
            sprint: true,
            ..PlayerInput::default()
        };
        player.handle_input(&sprint_still, 1000.0);
        assert_eq!(player.stamina().current(), 100.0);

        let sprint_right = PlayerInput {
            direction: 1,
            sprint: true,
            ..PlayerInput::default()
        };
        for _ in 0..4 {
            player.handle_input(&sprint_right, 1000.0);
        }
        assert_eq!(player.velocity_x(), 6.0);
        assert_eq!(player.stamina().current(), 20.0);

        player.handle_input(&sprint_right, 1000.0);
        assert_eq!(player.stamina().current(), 0.0);
        player.handle_input(&sprint_right, 1000.0);
        assert_eq!(player.stamina().current(), 0.0);
        assert!(player.velocity_x() <= 6.0);
    }

    #[test]
    fn stamina_regenerates_only_after_delay() {
        let mut player = player();
        player.handle_input(
            &PlayerInput {
                jump: true,
                ..PlayerInput::default()
            },
            TICK_MS,
        );
        assert_eq!(player.stamina().current(), 85.0);

        player.update(500.0);
        player.update(500.0);
        assert_eq!(player.stamina().current(), 85.0);

        player.update(500.0);
        assert_eq!(player.stamina().current(), 90.0);

        for _ in 0..10 {
            player.update(1000.0);
        }
        assert_eq!(player.stamina().current(), 100.0);
    }

    #[test]
    fn zero_hp_is_terminal_and_freezes_motion() {
        let mut player = player();
        tick(
            &mut player,
            PlayerInput {
                direction: 1,
                jump: true,
                ..PlayerInput::default()
            },
        );
        assert!(player.velocity_x() != 0.0);

        player.damage_player(500);
        assert_eq!(player.hp().current(), 0.0);
        player.update(TICK_MS);
        assert!(player.is_dead());
        assert_eq!(player.velocity_x(), 0.0);
        assert_eq!(player.velocity_y(), 0.0);

        for _ in 0..10 {
            tick(
                &mut player,
                PlayerInput {
                    direction: -1,
                    jump: true,
                    ..PlayerInput::default()
                },
            );
            assert!(player.is_dead());
            assert_eq!(player.velocity_x(), 0.0);
            assert_eq!(player.velocity_y(), 0.0);
        }
    }

    #[test]
    fn debug_kill_sets_hp_to_zero() {
        let mut player = player();
        tick(
            &mut player,
            PlayerInput {
                debug_kill: true,
                ..PlayerInput::default()
            },
        );
        assert!(player.is_dead());
        assert_eq!(player.animation(), PlayerAnimation::Dead);
    }

    #[test]
    fn death_animation_nudges_then_holds_last_frame() {
        let mut player = player();
        player.damage_player(100);
        player.update(0.0);
        let (start_x, start_y) = (player.x(), player.y());

        for _ in 0..3 {
            player.update(200.0);
        }
        assert_eq!(player.frame_index(), 3);
        assert_eq!(player.x(), start_x + 15.0);
        assert_eq!(player.y(), start_y + 30.0);
        assert!(!player.death_animation_done());

        player.update(200.0);
        assert!(player.death_animation_done());
        assert_eq!(player.frame_index(), 3);
        for _ in 0..5 {
            player.update(200.0);
        }
        assert_eq!(player.frame_index(), 3);
        assert_eq!(player.x(), start_x + 15.0);
    }

    #[test]
    fn damage_clamps_at_zero_and_repeats_safely() {
        let mut player = player();
        player.damage_player(30);
        assert_eq!(player.hp().current(), 70.0);
        player.damage_player(1000);
        player.damage_player(1000);
        assert_eq!(player.hp().current(), 0.0);
    }

    #[test]
    fn walk_cycles_faster_at_higher_speed_with_floor() {
        let mut player = player();
        player.velocity_x = 0.75;
        assert_eq!(player.walk_frame_delay_ms(), 48.0);
        player.velocity_x = 3.0;
        assert_eq!(player.walk_frame_delay_ms(), 30.0);
        player.velocity_x = -6.0;
        assert_eq!(player.walk_frame_delay_ms(), 30.0);
    }

    #[test]
    fn walk_cadence_does_not_follow_jump_frame_timing() {
        let mut player = player();
        player.tuning.jump_frame_ms = 100.0;
        player.velocity_x = 0.75;
        assert_eq!(player.walk_frame_delay_ms(), 48.0);
        player.tuning.walk_frame_base_ms = 24.0;
        assert_eq!(player.walk_frame_delay_ms(), 96.0);
    }

    #[test]
    fn facing_follows_velocity_and_idle_uses_first_walk_frame() {
        let mut player = player();
        player.set_horizontal(300.0, -3.0);
        player.update(TICK_MS);
        assert!(player.facing_left());
        assert_eq!(player.animation(), PlayerAnimation::Walk);

        player.set_horizontal(300.0, 0.0);
        player.update(TICK_MS);
        assert_eq!(player.animation(), PlayerAnimation::Idle);
        assert!(player.facing_left());
        assert!(player.current_sprite().is_some());
    }

    #[test]
    fn missing_frames_fall_back_to_placeholder_rect() {
        let player = PlayerController::new(
            &HeroStats::default(),
            viewport(),
            PlayerFrames::default(),
            PlayerTuning::default(),
        );
        assert_eq!(player.geometry().rect_width, 50.0);
        assert_eq!(player.geometry().rect_height, 270.0);
        assert!(player.current_sprite().is_none());
    }

    #[test]
    fn hud_colours_track_ratios() {
        let mut player = player();
        let [hp, mana, stamina] = player.hud_bars();
        assert_eq!(hp.color, [180, 40, 40]);
        assert_eq!(mana.color, [60, 60, 230]);
        assert_eq!(stamina.color, [60, 200, 60]);

        player.damage_player(50);
        player.stamina.current = 10.0;
        let [hp, _, stamina] = player.hud_bars();
        assert_eq!(hp.color, [200, 140, 20]);
        assert_eq!(stamina.color, [140, 60, 20]);
    }

    #[test]
    fn saved_hero_stats_become_full_meters() {
        let temp = tempfile::tempdir().expect("tempdir");
        save_hero(temp.path(), &HeroStats::with_stats(120, 60, 70)).expect("save hero");

        let hero = load_hero_stats(temp.path());
        let player = PlayerController::new(
            &hero,
            viewport(),
            PlayerFrames::default(),
            PlayerTuning::default(),
        );
        assert_eq!(player.hp().max(), 120.0);
        assert_eq!(player.mana().max(), 60.0);
        assert_eq!(player.stamina().max(), 70.0);
        assert_eq!(player.hp().current(), 120.0);
        assert_eq!(player.mana().current(), 60.0);
        assert_eq!(player.stamina().current(), 70.0);
    }
}
