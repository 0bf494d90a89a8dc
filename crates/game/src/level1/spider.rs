use std::sync::Arc;

use castle_engine::{AudioSink, FrameSet, LoopHandle, Sprite};
use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, info};

use super::context::{chance, random_sign, roll_ms, TickContext};
use super::player::DamageSink;
use super::tuning::SpiderTuning;

pub const WALK_LOOP_CLIP: &str = "level_1/spider/walk/Spider_walk";
pub const JUMP_CLIP: &str = "level_1/spider/jump/spider_jump";
pub const DEATH_CLIP: &str = "level_1/spider/dead/dead";
pub const ATTACK_CLIPS: [&str; 2] = [
    "level_1/spider/atack/atack_1",
    "level_1/spider/atack/atack_2",
];

/// World x and scale of every spider placed at level start.
pub const INITIAL_SPIDERS: [(f64, f64); 10] = [
    (12_000.0, 0.6),
    (12_050.0, 0.65),
    (12_950.0, 0.55),
    (12_100.0, 0.4),
    (12_100.0, 0.4),
    (12_100.0, 0.4),
    (12_100.0, 0.4),
    (12_100.0, 0.4),
    (12_100.0, 0.4),
    (12_500.0, 1.3),
];

const BASE_GROUND_Y: f64 = 770.0;
const GROUND_DROP_PER_SCALE: f64 = 50.0;

/// Footstep and attack volume for a spider `distance` pixels from the player.
pub fn spider_sound_volume(distance: f64, tuning: &SpiderTuning) -> f32 {
    if distance >= tuning.sound_max_distance {
        return 0.0;
    }
    let falloff = (1.0 - distance / tuning.sound_max_distance).powi(2) as f32;
    falloff.max(tuning.sound_min_volume)
}

#[derive(Debug, Clone, Default)]
pub struct SpiderFrames {
    pub stay: Arc<FrameSet>,
    pub walk: Arc<FrameSet>,
    pub attack: Arc<FrameSet>,
    pub jump: Arc<FrameSet>,
    pub dead: Arc<FrameSet>,
}

impl SpiderFrames {
    pub fn placeholder(frame_count: usize, width: u32, height: u32) -> Self {
        let set = Arc::new(FrameSet::placeholder(frame_count, width, height));
        Self {
            stay: Arc::clone(&set),
            walk: Arc::clone(&set),
            attack: Arc::clone(&set),
            jump: Arc::clone(&set),
            dead: set,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    /// Aimed at the player; deals damage once per jump.
    Attack,
    /// Gap-closing hop toward a distant player; harmless.
    Directional,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jump {
    pub kind: JumpKind,
    pub vx: f64,
    pub vy: f64,
    pub has_attacked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpiderState {
    Wander,
    AggroPause {
        waited_ms: f64,
    },
    Chasing,
    AggroStopping {
        elapsed_ms: f64,
        duration_ms: f64,
    },
    Jumping(Jump),
    AfterJumpPause {
        elapsed_ms: f64,
        duration_ms: f64,
    },
    /// Terminal. `fall` carries the velocity of a spider killed mid-air.
    Dead {
        fall: Option<(f64, f64)>,
    },
}

#[derive(Debug, Clone, Default)]
struct DeathProgress {
    animation_done: bool,
    twitch_time_ms: f64,
    twitch_timer_ms: f64,
    twitch_delay_ms: f64,
    twitch_done: bool,
    fade_timer_ms: f64,
}

#[derive(Debug, Clone)]
pub struct Spider {
    tuning: SpiderTuning,
    x: f64,
    y: f64,
    ground_y: f64,
    scale: f64,
    flipped: bool,
    frames: SpiderFrames,
    state: SpiderState,
    frame_index: usize,
    frame_timer_ms: f64,

    walking: bool,
    walk_loop: Option<LoopHandle>,
    walk_direction: f64,
    walk_elapsed_ms: f64,
    walk_duration_ms: f64,
    walk_timer_ms: f64,
    next_walk_decision_ms: f64,

    aggro_speed: f64,
    attack_count: u32,
    far_jump_timer_ms: f64,
    far_jump_cooldown_ms: f64,

    death: DeathProgress,
    fade_alpha: u8,
}

impl Spider {
    pub fn new(
        tuning: SpiderTuning,
        x: f64,
        scale: f64,
        frames: SpiderFrames,
        rng: &mut SmallRng,
    ) -> Self {
        let ground_y = (BASE_GROUND_Y + GROUND_DROP_PER_SCALE * scale).trunc();
        Self {
            x,
            y: ground_y,
            ground_y,
            scale,
            flipped: rng.random_bool(0.5),
            frames,
            state: SpiderState::Wander,
            frame_index: 0,
            frame_timer_ms: 0.0,
            walking: false,
            walk_loop: None,
            walk_direction: 0.0,
            walk_elapsed_ms: 0.0,
            walk_duration_ms: 0.0,
            walk_timer_ms: 0.0,
            next_walk_decision_ms: roll_ms(rng, tuning.min_decision_ms, tuning.max_decision_ms),
            aggro_speed: tuning.aggro_initial_speed / (0.7 + scale / 8.0),
            attack_count: 0,
            far_jump_timer_ms: 0.0,
            far_jump_cooldown_ms: roll_ms(
                rng,
                tuning.min_far_jump_check_ms,
                tuning.max_far_jump_check_ms,
            ),
            death: DeathProgress::default(),
            fade_alpha: 255,
            tuning,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn flipped(&self) -> bool {
        self.flipped
    }

    pub fn state(&self) -> SpiderState {
        self.state
    }

    pub fn attack_count(&self) -> u32 {
        self.attack_count
    }

    pub fn fade_alpha(&self) -> u8 {
        self.fade_alpha
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn is_dead(&self) -> bool {
        matches!(self.state, SpiderState::Dead { .. })
    }

    pub fn is_walking(&self) -> bool {
        self.walking
    }

    pub fn dead_animation_done(&self) -> bool {
        self.death.animation_done
    }

    pub fn center_x(&self) -> f64 {
        self.x + f64::from(self.frames.walk.frame_width() / 2)
    }

    pub fn current_sprite(&self) -> Option<&Sprite> {
        self.current_frames().frame(self.frame_index)
    }

    fn current_frames(&self) -> &FrameSet {
        match self.state {
            SpiderState::Dead { .. } => &self.frames.dead,
            SpiderState::Jumping(Jump {
                kind: JumpKind::Attack,
                ..
            }) => &self.frames.attack,
            SpiderState::Jumping(Jump {
                kind: JumpKind::Directional,
                ..
            }) => &self.frames.jump,
            _ if self.walking => &self.frames.walk,
            _ => &self.frames.stay,
        }
    }

    /// Dead, fully faded and out of the player's sight.
    pub fn should_be_removed(&self, player_x: f64) -> bool {
        self.is_dead()
            && self.fade_alpha == 0
            && (self.center_x() - player_x).abs() > self.tuning.reap_distance
    }

    pub fn stop_sounds(&mut self, audio: &mut dyn AudioSink) {
        if let Some(handle) = self.walk_loop.take() {
            audio.stop_loop(handle);
        }
    }

    /// Restarts the footstep loop of a spider that was still walking when its sounds were stopped.
    pub fn resume_sounds(&mut self, audio: &mut dyn AudioSink, player_x: f64) {
        if self.walking && self.walk_loop.is_none() && !self.is_dead() {
            let distance = (self.center_x() - player_x).abs();
            let volume = spider_sound_volume(distance, &self.tuning);
            self.walk_loop = audio.play_looping(WALK_LOOP_CLIP, volume);
        }
    }

    pub fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        player_x: f64,
        damage: &mut dyn DamageSink,
    ) {
        let dt = ctx.dt_ms;
        if self.is_dead() {
            self.continue_fall();
            self.animate_dead(dt, player_x, ctx.rng);
            return;
        }

        let distance = (self.center_x() - player_x).abs();
        if self.state == SpiderState::Wander && distance <= self.tuning.aggro_distance {
            self.enter_aggro(ctx.audio, distance);
        }

        match &mut self.state {
            SpiderState::Wander => {
                self.random_walk(ctx, player_x);
                return;
            }
            SpiderState::AggroPause { waited_ms } => {
                *waited_ms += dt;
                let settled = *waited_ms >= self.tuning.aggro_settle_ms;
                self.set_walking(false, ctx.audio, distance);
                if settled {
                    self.state = SpiderState::Chasing;
                    self.set_walking(true, ctx.audio, distance);
                }
                return;
            }
            _ => {}
        }

        if matches!(
            self.state,
            SpiderState::Chasing | SpiderState::AggroStopping { .. }
        ) && distance >= self.tuning.far_jump_distance
            && self.check_far_jump(ctx, player_x)
        {
            return;
        }

        match &mut self.state {
            SpiderState::Jumping(_) => {
                self.handle_jump(ctx, player_x, damage);
                self.animate(dt);
                return;
            }
            SpiderState::AfterJumpPause {
                elapsed_ms,
                duration_ms,
            } => {
                *elapsed_ms += dt;
                if *elapsed_ms >= *duration_ms {
                    self.state = SpiderState::Chasing;
                }
                return;
            }
            _ => {}
        }

        self.chase(ctx, player_x, distance);

        if matches!(self.state, SpiderState::Jumping(_)) {
            self.handle_jump(ctx, player_x, damage);
            self.animate(dt);
            return;
        }
        self.update_walk_volume(ctx.audio, distance);
    }

    fn enter_aggro(&mut self, audio: &mut dyn AudioSink, distance: f64) {
        self.state = SpiderState::AggroPause { waited_ms: 0.0 };
        self.set_walking(false, audio, distance);
        self.walk_direction = 0.0;
        self.aggro_speed = self.tuning.aggro_initial_speed;
        info!(x = self.x, scale = self.scale, distance, "spider_aggro");
    }

    fn random_walk(&mut self, ctx: &mut TickContext<'_>, player_x: f64) {
        let tuning = self.tuning;
        self.walk_timer_ms += ctx.dt_ms;
        let distance = (self.x - player_x).abs();
        self.update_walk_volume(ctx.audio, distance);

        if self.walking {
            self.walk_elapsed_ms += ctx.dt_ms;
            self.x += self.walk_direction * tuning.walk_speed / (0.5 + self.scale / 2.0);
            if self.walk_elapsed_ms >= self.walk_duration_ms {
                self.set_walking(false, ctx.audio, distance);
                self.walk_timer_ms = 0.0;
                self.walk_direction = 0.0;
                self.next_walk_decision_ms =
                    roll_ms(ctx.rng, tuning.min_decision_ms, tuning.max_decision_ms);
            }
        } else if self.walk_timer_ms >= self.next_walk_decision_ms {
            if chance(ctx.rng, tuning.walk_probability) {
                self.set_walking(true, ctx.audio, distance);
                self.walk_elapsed_ms = 0.0;
                self.walk_duration_ms = roll_ms(ctx.rng, tuning.min_walk_ms, tuning.max_walk_ms);
                self.walk_direction = random_sign(ctx.rng);
                self.flipped = self.walk_direction > 0.0;
            }
            self.walk_timer_ms = 0.0;
            self.next_walk_decision_ms =
                roll_ms(ctx.rng, tuning.min_decision_ms, tuning.max_decision_ms);
        }

        self.animate(ctx.dt_ms);
    }

    /// Returns true when a directional jump was started.
    fn check_far_jump(&mut self, ctx: &mut TickContext<'_>, player_x: f64) -> bool {
        self.far_jump_timer_ms += ctx.dt_ms;
        if self.far_jump_timer_ms < self.far_jump_cooldown_ms {
            return false;
        }
        self.far_jump_timer_ms = 0.0;
        self.far_jump_cooldown_ms = roll_ms(
            ctx.rng,
            self.tuning.min_far_jump_check_ms,
            self.tuning.max_far_jump_check_ms,
        );
        if !chance(ctx.rng, self.tuning.far_jump_probability) {
            return false;
        }
        let distance = (self.x - player_x).abs();
        self.set_walking(false, ctx.audio, distance);
        self.walk_direction = 0.0;
        self.start_directional_jump(ctx, player_x);
        true
    }

    fn chase(&mut self, ctx: &mut TickContext<'_>, player_x: f64, distance: f64) {
        let tuning = self.tuning;
        if let SpiderState::AggroStopping {
            elapsed_ms,
            duration_ms,
        } = &mut self.state
        {
            *elapsed_ms += ctx.dt_ms;
            if *elapsed_ms >= *duration_ms {
                self.state = SpiderState::Chasing;
            }
            self.set_walking(false, ctx.audio, distance);
            return;
        }

        let center = self.center_x();
        let stop_distance = tuning.stop_distance * self.scale;
        let target = if center < player_x {
            player_x - stop_distance
        } else {
            player_x + stop_distance
        };
        self.flipped = center < player_x;
        let direction = if target > center { 1.0 } else { -1.0 };

        let max_speed = tuning.aggro_max_speed / (0.7 + self.scale / 8.0);
        if self.aggro_speed < max_speed {
            self.aggro_speed =
                (self.aggro_speed + tuning.aggro_acceleration / self.scale).min(max_speed);
        }
        self.x += direction * self.aggro_speed;

        if chance(ctx.rng, tuning.stop_probability) {
            self.state = SpiderState::AggroStopping {
                elapsed_ms: 0.0,
                duration_ms: roll_ms(ctx.rng, tuning.min_stop_ms, tuning.max_stop_ms),
            };
            return;
        }

        self.set_walking(true, ctx.audio, distance);
        self.walk_direction = direction;

        if (center - target).abs() <= tuning.attack_trigger_window {
            self.set_walking(false, ctx.audio, distance);
            self.walk_direction = 0.0;
            self.start_jump_attack(ctx, player_x);
            return;
        }

        self.animate(ctx.dt_ms);
    }

    fn start_jump_attack(&mut self, ctx: &mut TickContext<'_>, player_x: f64) {
        let tuning = self.tuning;
        let dx = player_x - self.center_x();
        let min_range = tuning.min_attack_range * self.scale;
        let mut total = dx.clamp(-tuning.max_jump_range, tuning.max_jump_range);
        if total > 0.0 && total < min_range {
            total = min_range;
        } else if total < 0.0 && total > -min_range {
            total = -min_range;
        }

        self.state = SpiderState::Jumping(Jump {
            kind: JumpKind::Attack,
            vx: total / tuning.attack_flight_ticks,
            vy: 2.0 * tuning.attack_arc_height / tuning.attack_arc_ticks,
            has_attacked: false,
        });
        self.flipped = dx > 0.0;
        self.frame_index = 0;

        let volume = spider_sound_volume((self.x - player_x).abs(), &tuning);
        let clip = ATTACK_CLIPS[ctx.rng.random_range(0..ATTACK_CLIPS.len())];
        ctx.audio.play_sound(clip, volume);
    }

    fn start_directional_jump(&mut self, ctx: &mut TickContext<'_>, player_x: f64) {
        let tuning = self.tuning;
        let dx = player_x - self.center_x();
        let arc = ctx.rng.random_range(
            tuning.min_directional_arc..=tuning.max_directional_arc.max(tuning.min_directional_arc),
        );
        let total = dx.clamp(-tuning.max_jump_range, tuning.max_jump_range);

        self.state = SpiderState::Jumping(Jump {
            kind: JumpKind::Directional,
            vx: total / tuning.directional_flight_ticks,
            vy: 2.0 * -f64::from(arc) / tuning.directional_flight_ticks,
            has_attacked: false,
        });
        self.flipped = dx > 0.0;
        self.frame_index = 0;

        let volume = spider_sound_volume((self.x - player_x).abs(), &tuning);
        ctx.audio.play_sound(JUMP_CLIP, volume);
        debug!(x = self.x, dx, "spider_far_jump");
    }

    fn handle_jump(
        &mut self,
        ctx: &mut TickContext<'_>,
        player_x: f64,
        damage: &mut dyn DamageSink,
    ) {
        let tuning = self.tuning;
        let half_width = f64::from(self.frames.walk.frame_width() / 2);
        let SpiderState::Jumping(jump) = &mut self.state else {
            return;
        };

        self.x += jump.vx;
        self.y += jump.vy;
        jump.vy += tuning.jump_gravity * tuning.jump_step_secs * tuning.jump_step_secs;

        if jump.kind == JumpKind::Attack && !jump.has_attacked {
            let center = self.x + half_width;
            if (center - player_x).abs() < tuning.hit_radius * self.scale {
                jump.has_attacked = true;
                self.attack_count += 1;
                let amount = (tuning.damage * self.scale).trunc() as u32;
                damage.damage_player(amount);
                debug!(amount, attack_count = self.attack_count, "spider_hit");
            }
            if self.attack_count >= tuning.attack_limit {
                let fall = (self.y < self.ground_y).then_some((jump.vx, jump.vy));
                self.die(ctx.audio, fall);
                return;
            }
        }

        if self.y >= self.ground_y {
            self.y = self.ground_y;
            self.state = SpiderState::AfterJumpPause {
                elapsed_ms: 0.0,
                duration_ms: roll_ms(ctx.rng, tuning.min_after_jump_ms, tuning.max_after_jump_ms),
            };
            self.frame_index = 0;
        }
    }

    fn die(&mut self, audio: &mut dyn AudioSink, fall: Option<(f64, f64)>) {
        self.stop_sounds(audio);
        self.walking = false;
        self.walk_direction = 0.0;
        self.state = SpiderState::Dead { fall };
        self.frame_index = 0;
        self.frame_timer_ms = 0.0;
        audio.play_sound(DEATH_CLIP, 1.0);
        info!(x = self.x, attack_count = self.attack_count, "spider_died");
    }

    fn continue_fall(&mut self) {
        let SpiderState::Dead { fall } = &mut self.state else {
            return;
        };
        let Some((vx, vy)) = fall.as_mut() else {
            return;
        };
        self.x += *vx;
        self.y += *vy;
        *vy += self.tuning.jump_gravity * self.tuning.jump_step_secs * self.tuning.jump_step_secs;
        if self.y >= self.ground_y {
            self.y = self.ground_y;
            *fall = None;
        }
    }

    fn animate(&mut self, dt_ms: f64) {
        if self.is_dead() {
            return;
        }
        self.frame_timer_ms += dt_ms;
        if self.frame_timer_ms < self.tuning.frame_ms {
            return;
        }
        self.frame_timer_ms = 0.0;
        let frames = self.current_frames();
        let len = frames.len();
        let last = frames.last_index();
        if matches!(self.state, SpiderState::Jumping(_)) {
            if self.frame_index < last {
                self.frame_index += 1;
            }
        } else if len > 0 {
            self.frame_index = (self.frame_index + 1) % len;
        }
    }

    fn animate_dead(&mut self, dt_ms: f64, player_x: f64, rng: &mut SmallRng) {
        let tuning = self.tuning;
        let last = self.frames.dead.last_index();
        self.frame_timer_ms += dt_ms;

        if self.frame_index < last && !self.death.animation_done {
            if self.frame_timer_ms >= tuning.frame_ms {
                self.frame_timer_ms = 0.0;
                self.frame_index += 1;
            }
        } else if !self.death.twitch_done {
            if !self.death.animation_done {
                self.death.animation_done = true;
                self.death.twitch_delay_ms = tuning.twitch_base_ms;
            }
            self.death.twitch_time_ms += dt_ms;
            if self.death.twitch_time_ms >= tuning.twitch_ms {
                self.death.twitch_done = true;
                self.frame_index = last;
            } else {
                self.death.twitch_timer_ms += dt_ms;
                if self.death.twitch_timer_ms >= self.death.twitch_delay_ms {
                    let adjusted = (tuning.twitch_base_ms
                        * (1.0 + tuning.twitch_growth * self.death.twitch_time_ms))
                        .trunc() as u32;
                    self.death.twitch_timer_ms = 0.0;
                    self.death.twitch_delay_ms =
                        roll_ms(rng, adjusted, adjusted.saturating_add(tuning.twitch_jitter_ms));
                    self.frame_index = last.saturating_sub(rng.random_range(0..3));
                }
            }
        }

        if self.death.twitch_done
            && (self.center_x() - player_x).abs() > tuning.fade_distance
            && self.fade_alpha > 0
        {
            self.death.fade_timer_ms += dt_ms;
            let progress = self.death.fade_timer_ms / tuning.fade_ms;
            self.fade_alpha = (255.0 * (1.0 - progress)).clamp(0.0, 255.0) as u8;
        }
    }

    fn set_walking(&mut self, walking: bool, audio: &mut dyn AudioSink, distance: f64) {
        if self.walking != walking {
            self.frame_index = 0;
        }
        self.walking = walking;
        if walking {
            if self.walk_loop.is_none() {
                let volume = spider_sound_volume(distance, &self.tuning);
                self.walk_loop = audio.play_looping(WALK_LOOP_CLIP, volume);
            }
        } else {
            self.stop_sounds(audio);
        }
    }

    fn update_walk_volume(&mut self, audio: &mut dyn AudioSink, distance: f64) {
        if let Some(handle) = self.walk_loop {
            audio.set_loop_volume(handle, spider_sound_volume(distance, &self.tuning));
        }
    }
}

fn player_center(hero_world_x: f64, player_width: f64) -> f64 {
    hero_world_x + (player_width / 2.0).trunc()
}

/// Owns every spider of the level and delivers their bites to the player.
#[derive(Debug, Clone)]
pub struct SpiderSwarm {
    tuning: SpiderTuning,
    spiders: Vec<Spider>,
}

impl SpiderSwarm {
    pub fn new(tuning: SpiderTuning) -> Self {
        Self {
            tuning,
            spiders: Vec::new(),
        }
    }

    pub fn spiders(&self) -> &[Spider] {
        &self.spiders
    }

    pub fn len(&self) -> usize {
        self.spiders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spiders.is_empty()
    }

    /// Places the fixed level-start spiders; `frames_for` yields frames sized for a scale.
    pub fn spawn_initial(
        &mut self,
        rng: &mut SmallRng,
        mut frames_for: impl FnMut(f64) -> SpiderFrames,
    ) {
        self.spiders.clear();
        for (x, scale) in INITIAL_SPIDERS {
            self.spawn(x, scale, frames_for(scale), rng);
        }
        info!(count = self.spiders.len(), "spiders_spawned");
    }

    pub fn spawn(&mut self, x: f64, scale: f64, frames: SpiderFrames, rng: &mut SmallRng) {
        self.spiders
            .push(Spider::new(self.tuning, x, scale, frames, rng));
    }

    pub fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        hero_world_x: f64,
        player_width: f64,
        damage: &mut dyn DamageSink,
    ) {
        let player_center = player_center(hero_world_x, player_width);
        for spider in &mut self.spiders {
            spider.update(ctx, player_center, damage);
        }

        let before = self.spiders.len();
        self.spiders
            .retain(|spider| !spider.should_be_removed(player_center));
        let removed = before - self.spiders.len();
        if removed > 0 {
            info!(removed, remaining = self.spiders.len(), "spiders_reaped");
        }
    }

    /// Back-to-front draw order.
    pub fn spiders_by_depth(&self) -> Vec<&Spider> {
        let mut ordered: Vec<&Spider> = self.spiders.iter().collect();
        ordered.sort_by(|a, b| a.y.total_cmp(&b.y));
        ordered
    }

    pub fn stop_all_sounds(&mut self, audio: &mut dyn AudioSink) {
        for spider in &mut self.spiders {
            spider.stop_sounds(audio);
        }
    }

    pub fn resume_all_sounds(
        &mut self,
        audio: &mut dyn AudioSink,
        hero_world_x: f64,
        player_width: f64,
    ) {
        let player_center = player_center(hero_world_x, player_width);
        for spider in &mut self.spiders {
            spider.resume_sounds(audio, player_center);
        }
    }

    pub fn reset(&mut self, audio: &mut dyn AudioSink) {
        self.stop_all_sounds(audio);
        self.spiders.clear();
    }

    #[cfg(test)]
    fn spider_mut(&mut self, index: usize) -> &mut Spider {
        &mut self.spiders[index]
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::super::test_support::{CountingDamage, RecordingAudio};
    use super::*;

    const HALF_WIDTH: f64 = 20.0;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(9)
    }

    fn calm_tuning() -> SpiderTuning {
        SpiderTuning {
            stop_probability: 0.0,
            far_jump_probability: 0.0,
            ..SpiderTuning::default()
        }
    }

    fn spider(tuning: SpiderTuning, x: f64, scale: f64, rng: &mut SmallRng) -> Spider {
        Spider::new(tuning, x, scale, SpiderFrames::placeholder(6, 40, 30), rng)
    }

    fn tick(
        spider: &mut Spider,
        player_x: f64,
        dt_ms: f64,
        rng: &mut SmallRng,
        audio: &mut RecordingAudio,
        damage: &mut CountingDamage,
    ) {
        let mut ctx = TickContext::new(dt_ms, rng, audio);
        spider.update(&mut ctx, player_x, damage);
    }

    #[test]
    fn sound_falls_off_quadratically_with_a_floor() {
        let tuning = SpiderTuning::default();
        assert_eq!(spider_sound_volume(0.0, &tuning), 1.0);
        assert_eq!(spider_sound_volume(750.0, &tuning), 0.25);
        assert_eq!(spider_sound_volume(1400.0, &tuning), 0.1);
        assert_eq!(spider_sound_volume(1500.0, &tuning), 0.0);
        assert_eq!(spider_sound_volume(9000.0, &tuning), 0.0);
    }

    #[test]
    fn spawn_places_spider_on_its_scaled_ground_line() {
        let mut rng = rng();
        let spider = spider(calm_tuning(), 100.0, 0.65, &mut rng);
        assert_eq!(spider.y(), 802.0);
        assert_eq!(spider.center_x(), 100.0 + HALF_WIDTH);
        assert_eq!(spider.state(), SpiderState::Wander);
    }

    #[test]
    fn close_player_triggers_aggro_then_chase() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut damage = CountingDamage::default();
        let mut far = spider(calm_tuning(), 5000.0, 1.0, &mut rng);
        let mut near = spider(calm_tuning(), 1000.0, 1.0, &mut rng);

        tick(&mut far, 1000.0, 33.0, &mut rng, &mut audio, &mut damage);
        assert_eq!(far.state(), SpiderState::Wander);

        tick(&mut near, 1400.0, 33.0, &mut rng, &mut audio, &mut damage);
        assert_eq!(near.state(), SpiderState::AggroPause { waited_ms: 33.0 });
        assert!(!near.is_walking());

        for _ in 0..6 {
            tick(&mut near, 1400.0, 33.0, &mut rng, &mut audio, &mut damage);
        }
        assert_eq!(near.state(), SpiderState::Chasing);
        assert!(near.is_walking());

        tick(&mut near, 3000.0, 33.0, &mut rng, &mut audio, &mut damage);
        assert_ne!(near.state(), SpiderState::Wander);
    }

    #[test]
    fn chase_speed_ramps_up_to_scaled_cap() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut damage = CountingDamage::default();
        let scale = 1.3;
        let mut spider = spider(calm_tuning(), 0.0, scale, &mut rng);
        spider.state = SpiderState::Chasing;
        spider.aggro_speed = 2.0;

        let max = 3.5 / (0.7 + scale / 8.0);
        let mut last_x = spider.x();
        for _ in 0..400 {
            tick(&mut spider, 100_000.0, 33.0, &mut rng, &mut audio, &mut damage);
            assert!(spider.aggro_speed <= max);
            assert!(spider.x() > last_x);
            last_x = spider.x();
        }
        assert_eq!(spider.aggro_speed, max);
        assert!(spider.flipped());
    }

    #[test]
    fn attack_jump_damages_the_player_exactly_once() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut damage = CountingDamage::default();
        let scale = 0.75;
        let player_x = 2000.0;
        let mut spider = spider(calm_tuning(), player_x - 150.0 - HALF_WIDTH, scale, &mut rng);
        spider.state = SpiderState::Chasing;

        {
            let mut ctx = TickContext::new(33.0, &mut rng, &mut audio);
            spider.start_jump_attack(&mut ctx, player_x);
        }
        assert!(ATTACK_CLIPS.contains(&audio.sounds()[0]));
        let SpiderState::Jumping(jump) = spider.state() else {
            panic!("expected jump, got {:?}", spider.state());
        };
        assert_eq!(jump.kind, JumpKind::Attack);
        assert_eq!(jump.vy, -7.5);
        assert!(spider.flipped());

        let mut ticks = 0;
        while matches!(spider.state(), SpiderState::Jumping(_)) {
            tick(&mut spider, player_x, 33.0, &mut rng, &mut audio, &mut damage);
            ticks += 1;
            assert!(ticks < 100, "jump never landed");
        }

        assert_eq!(damage.calls, vec![7]);
        assert_eq!(spider.attack_count(), 1);
        assert!(matches!(spider.state(), SpiderState::AfterJumpPause { .. }));
        assert_eq!(spider.y(), spider.ground_y);
        assert!(spider.x() > player_x - HALF_WIDTH);
    }

    #[test]
    fn long_attack_flight_still_bites_once() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut damage = CountingDamage::default();
        let scale = 0.75;
        let player_x = 2000.0;
        let tuning = calm_tuning();
        assert_eq!(tuning.stop_distance * scale, 150.0);
        let mut spider = spider(tuning, player_x - 200.0 - HALF_WIDTH, scale, &mut rng);
        spider.state = SpiderState::Chasing;
        {
            let mut ctx = TickContext::new(33.0, &mut rng, &mut audio);
            spider.start_jump_attack(&mut ctx, player_x);
        }

        let mut ticks = 0;
        let mut ticks_over_player = 0;
        while matches!(spider.state(), SpiderState::Jumping(_)) {
            tick(&mut spider, player_x, 33.0, &mut rng, &mut audio, &mut damage);
            if (spider.center_x() - player_x).abs() < tuning.hit_radius * scale {
                ticks_over_player += 1;
            }
            ticks += 1;
            assert!(ticks < 100, "jump never landed");
        }

        assert!(ticks_over_player > 1);
        assert_eq!(damage.calls, vec![7]);
        assert_eq!(spider.attack_count(), 1);
        assert!(spider.center_x() > player_x);
    }

    #[test]
    fn attack_arc_ignores_directional_flight_tuning() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let tuning = SpiderTuning {
            directional_flight_ticks: 10.0,
            ..calm_tuning()
        };
        let mut spider = spider(tuning, 1000.0 - HALF_WIDTH, 1.0, &mut rng);
        let mut ctx = TickContext::new(33.0, &mut rng, &mut audio);
        spider.start_jump_attack(&mut ctx, 1300.0);
        let SpiderState::Jumping(jump) = spider.state() else {
            panic!("expected jump");
        };
        assert_eq!(jump.vy, -7.5);
        assert_eq!(jump.vx, 300.0 / 27.0);
    }

    #[test]
    fn short_attack_range_is_widened_to_minimum() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut spider = spider(calm_tuning(), 1000.0 - HALF_WIDTH, 1.0, &mut rng);
        let mut ctx = TickContext::new(33.0, &mut rng, &mut audio);
        spider.start_jump_attack(&mut ctx, 1010.0);
        let SpiderState::Jumping(jump) = spider.state() else {
            panic!("expected jump");
        };
        assert_eq!(jump.vx, 100.0 / 27.0);
    }

    #[test]
    fn fifth_attack_kills_and_corpse_lingers_until_faded_and_far() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut damage = CountingDamage::default();
        let player_x = 2000.0;
        let mut spider = spider(calm_tuning(), player_x - 150.0 - HALF_WIDTH, 0.75, &mut rng);
        spider.state = SpiderState::Chasing;
        spider.attack_count = 4;
        {
            let mut ctx = TickContext::new(33.0, &mut rng, &mut audio);
            spider.start_jump_attack(&mut ctx, player_x);
        }

        let mut ticks = 0;
        while damage.calls.is_empty() {
            tick(&mut spider, player_x, 33.0, &mut rng, &mut audio, &mut damage);
            ticks += 1;
            assert!(ticks < 100, "spider never hit");
        }
        assert!(spider.is_dead());
        assert_eq!(spider.attack_count(), 5);
        assert!(audio.sounds().contains(&DEATH_CLIP));

        for _ in 0..400 {
            tick(&mut spider, player_x, 33.0, &mut rng, &mut audio, &mut damage);
        }
        assert_eq!(spider.y(), spider.ground_y);
        assert!(spider.dead_animation_done());
        assert_eq!(spider.fade_alpha(), 255);
        assert!(!spider.should_be_removed(player_x));

        let fading_x = spider.center_x() + 550.0;
        for _ in 0..70 {
            tick(&mut spider, fading_x, 33.0, &mut rng, &mut audio, &mut damage);
        }
        assert_eq!(spider.fade_alpha(), 0);
        assert!(!spider.should_be_removed(fading_x));
        assert!(spider.should_be_removed(spider.center_x() + 700.0));
        assert_eq!(damage.calls.len(), 1);
    }

    #[test]
    fn twitch_picks_among_last_three_frames_then_holds_last() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut damage = CountingDamage::default();
        let mut spider = spider(calm_tuning(), 0.0, 1.0, &mut rng);
        spider.die(&mut audio, None);

        let mut elapsed = 0.0;
        while !spider.dead_animation_done() {
            tick(&mut spider, 0.0, 33.0, &mut rng, &mut audio, &mut damage);
            elapsed += 33.0;
            assert!(elapsed < 2000.0);
        }
        for _ in 0..140 {
            tick(&mut spider, 0.0, 33.0, &mut rng, &mut audio, &mut damage);
            assert!((3..=5).contains(&spider.frame_index()), "{}", spider.frame_index());
        }
        for _ in 0..20 {
            tick(&mut spider, 0.0, 33.0, &mut rng, &mut audio, &mut damage);
        }
        assert_eq!(spider.frame_index(), 5);
        assert_eq!(spider.fade_alpha(), 255);
    }

    #[test]
    fn far_jump_only_fires_at_long_range() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut damage = CountingDamage::default();
        let tuning = SpiderTuning {
            far_jump_probability: 1.0,
            min_far_jump_check_ms: 100,
            max_far_jump_check_ms: 100,
            ..calm_tuning()
        };
        let mut spider = spider(tuning, 1000.0 - HALF_WIDTH, 1.0, &mut rng);
        spider.state = SpiderState::Chasing;

        for _ in 0..3 {
            tick(&mut spider, 1300.0, 200.0, &mut rng, &mut audio, &mut damage);
            assert_eq!(spider.state(), SpiderState::Chasing);
        }

        let far_player = spider.center_x() + 1000.0;
        tick(&mut spider, far_player, 100.0, &mut rng, &mut audio, &mut damage);
        let SpiderState::Jumping(jump) = spider.state() else {
            panic!("expected far jump, got {:?}", spider.state());
        };
        assert_eq!(jump.kind, JumpKind::Directional);
        assert_eq!(jump.vx, 600.0 / 40.0);
        assert!((-6.5..=-5.5).contains(&jump.vy), "vy {}", jump.vy);
        assert!(audio.sounds().contains(&JUMP_CLIP));
        assert!(!spider.is_walking());
    }

    #[test]
    fn walk_loop_starts_and_stops_only_on_transitions() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut damage = CountingDamage::default();
        let tuning = SpiderTuning {
            walk_probability: 1.0,
            min_decision_ms: 100,
            max_decision_ms: 100,
            min_walk_ms: 500,
            max_walk_ms: 500,
            ..calm_tuning()
        };
        let mut spider = spider(tuning, 0.0, 1.0, &mut rng);
        let player_x = 10_000.0;

        tick(&mut spider, player_x, 100.0, &mut rng, &mut audio, &mut damage);
        assert!(spider.is_walking());
        for _ in 0..4 {
            tick(&mut spider, player_x, 100.0, &mut rng, &mut audio, &mut damage);
        }
        assert_eq!(audio.loops_started(), 1);
        assert_eq!(audio.loops_stopped(), 0);

        tick(&mut spider, player_x, 100.0, &mut rng, &mut audio, &mut damage);
        assert!(!spider.is_walking());
        assert_eq!(audio.loops_started(), 1);
        assert_eq!(audio.loops_stopped(), 1);
    }

    #[test]
    fn swarm_spawns_fixed_spiders_and_sorts_by_depth() {
        let mut rng = rng();
        let mut swarm = SpiderSwarm::new(calm_tuning());
        let mut requested = Vec::new();
        swarm.spawn_initial(&mut rng, |scale| {
            requested.push(scale);
            SpiderFrames::placeholder(2, 10, 10)
        });
        assert_eq!(swarm.len(), INITIAL_SPIDERS.len());
        assert_eq!(requested.len(), INITIAL_SPIDERS.len());

        let depths: Vec<f64> = swarm.spiders_by_depth().iter().map(|s| s.y()).collect();
        assert!(depths.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(depths.last().copied(), Some(835.0));
    }

    #[test]
    fn swarm_reaps_faded_spiders_far_from_player() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut damage = CountingDamage::default();
        let mut swarm = SpiderSwarm::new(calm_tuning());
        swarm.spawn(20_000.0, 1.0, SpiderFrames::placeholder(3, 40, 30), &mut rng);
        swarm.spawn(30_000.0, 1.0, SpiderFrames::placeholder(3, 40, 30), &mut rng);
        {
            let dead = swarm.spider_mut(0);
            dead.die(&mut audio, None);
            dead.fade_alpha = 0;
        }

        let mut ctx = TickContext::new(33.0, &mut rng, &mut audio);
        swarm.update(&mut ctx, 0.0, 100.0, &mut damage);
        assert_eq!(swarm.len(), 1);
        assert_eq!(swarm.spiders()[0].x(), 30_000.0);
    }

    #[test]
    fn stopping_sounds_releases_walk_loops() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut swarm = SpiderSwarm::new(calm_tuning());
        swarm.spawn(0.0, 1.0, SpiderFrames::placeholder(3, 40, 30), &mut rng);
        swarm.spider_mut(0).set_walking(true, &mut audio, 0.0);

        swarm.reset(&mut audio);
        assert_eq!(audio.loops_started(), 1);
        assert_eq!(audio.loops_stopped(), 1);
        assert!(swarm.is_empty());
    }

    #[test]
    fn wandering_walker_gets_its_loop_back_after_a_pause() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut damage = CountingDamage::default();
        let tuning = SpiderTuning {
            walk_probability: 1.0,
            min_decision_ms: 100,
            max_decision_ms: 100,
            min_walk_ms: 1000,
            max_walk_ms: 1000,
            ..calm_tuning()
        };
        let mut spider = spider(tuning, 0.0, 1.0, &mut rng);
        let player_x = 10_000.0;

        tick(&mut spider, player_x, 100.0, &mut rng, &mut audio, &mut damage);
        assert!(spider.is_walking());
        spider.stop_sounds(&mut audio);
        spider.resume_sounds(&mut audio, player_x);
        for _ in 0..5 {
            tick(&mut spider, player_x, 100.0, &mut rng, &mut audio, &mut damage);
        }
        assert!(spider.is_walking());
        assert_eq!(audio.loops_started(), 2);
        assert_eq!(audio.loops_stopped(), 1);
    }

    #[test]
    fn swarm_resumes_loops_only_for_walkers() {
        let mut rng = rng();
        let mut audio = RecordingAudio::default();
        let mut swarm = SpiderSwarm::new(calm_tuning());
        swarm.spawn(0.0, 1.0, SpiderFrames::placeholder(3, 40, 30), &mut rng);
        swarm.spawn(500.0, 1.0, SpiderFrames::placeholder(3, 40, 30), &mut rng);
        swarm.spider_mut(0).set_walking(true, &mut audio, 0.0);

        swarm.stop_all_sounds(&mut audio);
        swarm.resume_all_sounds(&mut audio, 0.0, 100.0);
        swarm.resume_all_sounds(&mut audio, 0.0, 100.0);
        assert_eq!(audio.loops_started(), 2);
        assert_eq!(audio.loops_stopped(), 1);
    }
}
