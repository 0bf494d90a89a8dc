use std::sync::Arc;

use castle_engine::{FrameSet, Sprite, Viewport};
use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, info};

use super::context::{chance, random_sign, roll_ms, TickContext};
use super::tuning::CrowTuning;

pub const CAW_CLIP: &str = "level_1/crow/idle/caw/caw";
pub const FLIGHT_CAW_CLIPS: [&str; 2] = ["level_1/crow/crow_1", "level_1/crow/crow_2"];

#[derive(Debug, Clone, Default)]
pub struct CrowFrames {
    pub idle: Arc<FrameSet>,
    pub walk: Arc<FrameSet>,
    pub caw: Arc<FrameSet>,
    pub fly: Arc<FrameSet>,
}

impl CrowFrames {
    pub fn placeholder(frame_count: usize, width: u32, height: u32) -> Self {
        let set = Arc::new(FrameSet::placeholder(frame_count, width, height));
        Self {
            idle: Arc::clone(&set),
            walk: Arc::clone(&set),
            caw: Arc::clone(&set),
            fly: set,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrowState {
    Idle,
    Walking {
        direction: f64,
        elapsed_ms: f64,
        duration_ms: f64,
    },
    Cawing {
        sound_played: bool,
    },
    /// Startled; waits out a short random delay before taking off.
    PendingFlight {
        elapsed_ms: f64,
        delay_ms: f64,
    },
    Flying {
        angle_deg: f64,
        speed: f64,
        elapsed_ms: f64,
    },
    /// Left the screen after flying long enough; removed by the flock.
    OffScreen,
}

impl CrowState {
    pub fn is_grounded(&self) -> bool {
        matches!(
            self,
            CrowState::Idle | CrowState::Walking { .. } | CrowState::Cawing { .. }
        )
    }
}

/// What the crows need to know about the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrowView {
    pub scroll_offset: f64,
    pub viewport: Viewport,
}

#[derive(Debug, Clone)]
pub struct Crow {
    tuning: CrowTuning,
    group_id: u64,
    x: f64,
    y: f64,
    trigger_distance: f64,
    flipped: bool,
    frames: CrowFrames,
    state: CrowState,
    frame_index: usize,
    frame_timer_ms: f64,
    decision_timer_ms: f64,
    next_decision_ms: f64,
    flight_caw_delay_ms: f64,
    flight_caw_timer_ms: f64,
    flight_caw_played: bool,
}

impl Crow {
    pub fn new(
        tuning: CrowTuning,
        group_id: u64,
        x: f64,
        y: f64,
        trigger_distance: f64,
        frames: CrowFrames,
        rng: &mut SmallRng,
    ) -> Self {
        let frame_index = match frames.idle.len() {
            0 => 0,
            len => rng.random_range(0..len),
        };
        Self {
            group_id,
            x,
            y,
            trigger_distance,
            flipped: rng.random_bool(0.5),
            frames,
            state: CrowState::Idle,
            frame_index,
            frame_timer_ms: 0.0,
            decision_timer_ms: 0.0,
            next_decision_ms: roll_ms(rng, tuning.min_decision_ms, tuning.max_decision_ms),
            flight_caw_delay_ms: roll_ms(rng, 0, tuning.max_flight_caw_delay_ms),
            flight_caw_timer_ms: 0.0,
            flight_caw_played: false,
            tuning,
        }
    }

    pub fn group_id(&self) -> u64 {
        self.group_id
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn trigger_distance(&self) -> f64 {
        self.trigger_distance
    }

    pub fn flipped(&self) -> bool {
        self.flipped
    }

    pub fn state(&self) -> CrowState {
        self.state
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn is_off_screen(&self) -> bool {
        self.state == CrowState::OffScreen
    }

    /// Startles a grounded crow. Crows already taking off ignore it.
    pub fn start_flight(&mut self, rng: &mut SmallRng) {
        if !self.state.is_grounded() {
            return;
        }
        self.state = CrowState::PendingFlight {
            elapsed_ms: 0.0,
            delay_ms: roll_ms(rng, 0, self.tuning.max_preflight_delay_ms),
        };
    }

    pub fn current_sprite(&self) -> Option<&Sprite> {
        self.current_frames().frame(self.frame_index)
    }

    fn current_frames(&self) -> &FrameSet {
        match self.state {
            CrowState::Cawing { .. } => &self.frames.caw,
            CrowState::Flying { .. } | CrowState::OffScreen => &self.frames.fly,
            CrowState::Walking { .. } => &self.frames.walk,
            CrowState::Idle | CrowState::PendingFlight { .. } => &self.frames.idle,
        }
    }

    pub fn update(&mut self, ctx: &mut TickContext<'_>, view: &CrowView) {
        if self.state == CrowState::OffScreen {
            return;
        }

        if let CrowState::PendingFlight {
            elapsed_ms,
            delay_ms,
        } = &mut self.state
        {
            *elapsed_ms += ctx.dt_ms;
            if *elapsed_ms < *delay_ms {
                return;
            }
            self.launch(ctx.rng);
        }

        if matches!(self.state, CrowState::Flying { .. }) {
            self.fly(ctx, view);
            if self.state == CrowState::OffScreen {
                return;
            }
        } else {
            self.wander(ctx);
        }

        self.animate(ctx);
    }

    fn launch(&mut self, rng: &mut SmallRng) {
        let angle_deg = rng.random_range(
            self.tuning.min_launch_angle_deg
                ..=self.tuning.max_launch_angle_deg.max(self.tuning.min_launch_angle_deg),
        );
        self.state = CrowState::Flying {
            angle_deg,
            speed: self.tuning.initial_speed,
            elapsed_ms: 0.0,
        };
        self.frame_index = 0;
        self.frame_timer_ms = 0.0;
    }

    fn fly(&mut self, ctx: &mut TickContext<'_>, view: &CrowView) {
        let CrowState::Flying {
            angle_deg,
            speed,
            elapsed_ms,
        } = &mut self.state
        else {
            return;
        };
        *speed = (*speed + self.tuning.flight_acceleration * ctx.dt_ms / 1000.0)
            .min(self.tuning.max_speed);
        let radians = angle_deg.to_radians();
        self.x += *speed * radians.cos();
        self.y -= *speed * radians.sin();
        *elapsed_ms += ctx.dt_ms;
        let elapsed = *elapsed_ms;

        if !self.flight_caw_played {
            self.flight_caw_timer_ms += ctx.dt_ms;
            if self.flight_caw_timer_ms >= self.flight_caw_delay_ms {
                let clip = FLIGHT_CAW_CLIPS[ctx.rng.random_range(0..FLIGHT_CAW_CLIPS.len())];
                ctx.audio.play_sound(clip, 1.0);
                self.flight_caw_played = true;
            }
        }

        if elapsed > self.tuning.min_flight_ms && self.outside_view(view) {
            self.state = CrowState::OffScreen;
        }
    }

    fn outside_view(&self, view: &CrowView) -> bool {
        let margin = self.tuning.offscreen_margin;
        let screen_x = self.x - view.scroll_offset;
        screen_x < -margin
            || screen_x > view.viewport.width as f64 + margin
            || self.y < -margin
            || self.y > view.viewport.height as f64 + margin
    }

    fn wander(&mut self, ctx: &mut TickContext<'_>) {
        let tuning = self.tuning;
        self.decision_timer_ms += ctx.dt_ms;
        if self.decision_timer_ms >= self.next_decision_ms {
            self.decision_timer_ms = 0.0;
            self.next_decision_ms =
                roll_ms(ctx.rng, tuning.min_decision_ms, tuning.max_decision_ms);
            if !matches!(self.state, CrowState::Cawing { .. }) {
                self.decide(ctx.rng);
            }
        }

        if let CrowState::Walking {
            direction,
            elapsed_ms,
            duration_ms,
        } = &mut self.state
        {
            *elapsed_ms += ctx.dt_ms;
            if *elapsed_ms >= *duration_ms {
                self.state = CrowState::Idle;
            } else {
                let step = (tuning.walk_speed * ctx.dt_ms / 1000.0).min(tuning.max_walk_step);
                self.x += step * *direction;
            }
        }
    }

    fn decide(&mut self, rng: &mut SmallRng) {
        if chance(rng, self.tuning.walk_probability) {
            let direction = random_sign(rng);
            self.state = CrowState::Walking {
                direction,
                elapsed_ms: 0.0,
                duration_ms: roll_ms(rng, self.tuning.min_walk_ms, self.tuning.max_walk_ms),
            };
            self.flipped = direction < 0.0;
            self.frame_index = 0;
        } else {
            self.state = CrowState::Idle;
        }

        if self.state == CrowState::Idle && chance(rng, self.tuning.caw_probability) {
            self.state = CrowState::Cawing {
                sound_played: false,
            };
            self.frame_index = 0;
            self.frame_timer_ms = 0.0;
        }
    }

    fn animate(&mut self, ctx: &mut TickContext<'_>) {
        let frame_ms = self.tuning.frame_ms;
        if frame_ms <= 0.0 {
            return;
        }
        self.frame_timer_ms += ctx.dt_ms;

        if let CrowState::Cawing { mut sound_played } = self.state {
            let caw_len = self.frames.caw.len();
            let mut finished = false;
            while self.frame_timer_ms >= frame_ms {
                self.frame_timer_ms -= frame_ms;
                self.frame_index += 1;
                if !sound_played && self.frame_index >= 1 {
                    ctx.audio.play_sound(CAW_CLIP, 1.0);
                    sound_played = true;
                }
                if self.frame_index >= caw_len {
                    finished = true;
                    break;
                }
            }
            if finished {
                self.state = CrowState::Idle;
                self.frame_index = 0;
            } else {
                self.state = CrowState::Cawing { sound_played };
                return;
            }
        }

        let len = self.current_frames().len();
        while self.frame_timer_ms >= frame_ms {
            self.frame_timer_ms -= frame_ms;
            if len > 0 {
                self.frame_index = (self.frame_index + 1) % len;
            }
        }
    }
}

/// Ground-perching crow groups spawned ahead of the camera.
#[derive(Debug, Clone)]
pub struct CrowFlock {
    tuning: CrowTuning,
    frames: CrowFrames,
    crows: Vec<Crow>,
    next_group_id: u64,
    frontier: f64,
    spacing: f64,
}

impl CrowFlock {
    pub fn new(tuning: CrowTuning, frames: CrowFrames, rng: &mut SmallRng) -> Self {
        let mut flock = Self {
            tuning,
            frames,
            crows: Vec::new(),
            next_group_id: 1,
            frontier: tuning.first_frontier,
            spacing: 0.0,
        };
        flock.reset(rng);
        flock
    }

    pub fn reset(&mut self, rng: &mut SmallRng) {
        self.crows.clear();
        self.frontier = self.tuning.first_frontier;
        self.spacing = roll_ms(
            rng,
            self.tuning.min_frontier_spacing,
            self.tuning.max_frontier_spacing,
        );
    }

    pub fn crows(&self) -> &[Crow] {
        &self.crows
    }

    pub fn len(&self) -> usize {
        self.crows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crows.is_empty()
    }

    /// World x past which the next group spawns.
    pub fn frontier(&self) -> f64 {
        self.frontier
    }

    pub fn update(&mut self, ctx: &mut TickContext<'_>, hero_world_x: f64, view: &CrowView) {
        let visible_right = view.scroll_offset + view.viewport.width as f64;
        if visible_right > self.frontier {
            let x = self.frontier;
            self.spawn_group(x, ctx.rng);
            let jitter = self.tuning.frontier_jitter as f64;
            self.frontier += ctx
                .rng
                .random_range(self.spacing - jitter..=self.spacing + jitter);
        }

        self.trigger_nearby_groups(hero_world_x, ctx.rng);

        for crow in &mut self.crows {
            crow.update(ctx, view);
        }

        let before = self.crows.len();
        self.crows.retain(|crow| !crow.is_off_screen());
        let removed = before - self.crows.len();
        if removed > 0 {
            debug!(removed, remaining = self.crows.len(), "crows_left_screen");
        }
    }

    /// Spawns one group at world `x` and returns its id.
    pub fn spawn_group(&mut self, x: f64, rng: &mut SmallRng) -> u64 {
        let tuning = self.tuning;
        let group_id = self.next_group_id;
        self.next_group_id += 1;

        let size = rng
            .random_range(tuning.min_group_size..=tuning.max_group_size.max(tuning.min_group_size));
        let mut crow_x = x;
        for _ in 0..size {
            let perch_y =
                rng.random_range(tuning.min_perch_y..=tuning.max_perch_y.max(tuning.min_perch_y));
            let jitter = rng.random_range(-tuning.perch_jitter..=tuning.perch_jitter);
            let y = f64::from(perch_y + jitter);
            let trigger_distance =
                roll_ms(rng, tuning.min_trigger_distance, tuning.max_trigger_distance);
            self.crows.push(Crow::new(
                tuning,
                group_id,
                crow_x,
                y,
                trigger_distance,
                self.frames.clone(),
                rng,
            ));
            crow_x += roll_ms(rng, tuning.min_group_spacing, tuning.max_group_spacing);
        }
        info!(group_id, size, x, "crow_group_spawned");
        group_id
    }

    /// Any grounded crow within its trigger distance of the hero startles its whole group.
    pub fn trigger_nearby_groups(&mut self, hero_world_x: f64, rng: &mut SmallRng) -> Vec<u64> {
        let mut triggered: Vec<u64> = Vec::new();
        for crow in &self.crows {
            if crow.state.is_grounded()
                && (crow.x - hero_world_x).abs() < crow.trigger_distance
                && !triggered.contains(&crow.group_id)
            {
                triggered.push(crow.group_id);
            }
        }
        if triggered.is_empty() {
            return triggered;
        }
        for crow in &mut self.crows {
            if triggered.contains(&crow.group_id) {
                crow.start_flight(rng);
            }
        }
        for group_id in &triggered {
            info!(group_id = *group_id, hero_world_x, "crow_group_startled");
        }
        triggered
    }

    #[cfg(test)]
    fn push(&mut self, crow: Crow) {
        self.crows.push(crow);
    }

    #[cfg(test)]
    fn crow_mut(&mut self, index: usize) -> &mut Crow {
        &mut self.crows[index]
    }
}
