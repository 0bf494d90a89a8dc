//! Level 1 balance values.
//!
//! "Per tick" values apply once per simulation step; "per second" and "ms"
//! values are scaled by the step's `dt_ms`.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTuning {
    /// Per tick.
    pub acceleration: f64,
    pub friction: f64,
    pub snap_epsilon: f64,
    pub far_fog_divisor: f64,
    pub far_trees_divisor: f64,
    pub near_fog_divisor: f64,
    pub ground_divisor: f64,
    pub near_trees_divisor: f64,
    pub fog_base_speed: f64,
    pub fog_min_speed: f64,
    pub fog_max_speed: f64,
    /// Change of the fog speed per ms while easing toward its target.
    pub fog_easing_per_ms: f64,
    pub fog_settle_window: f64,
    /// Far fog drifts at this fraction of the near fog speed.
    pub far_fog_drift_ratio: f64,
}

impl Default for ScrollTuning {
    fn default() -> Self {
        Self {
            acceleration: 1.0,
            friction: 0.8,
            snap_epsilon: 0.2,
            far_fog_divisor: 0.9,
            far_trees_divisor: 2.0,
            near_fog_divisor: 1.9,
            ground_divisor: 1.0,
            near_trees_divisor: 1.0,
            fog_base_speed: 0.2,
            fog_min_speed: 0.1,
            fog_max_speed: 0.4,
            fog_easing_per_ms: 0.0005,
            fog_settle_window: 0.01,
            far_fog_drift_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerTuning {
    /// Per tick.
    pub speed: f64,
    pub acceleration: f64,
    pub sprint_multiplier: f64,
    pub friction: f64,
    pub stop_threshold: f64,
    pub jump_impulse: f64,
    pub gravity: f64,
    /// Per second.
    pub stamina_regen_per_sec: f64,
    pub run_cost_per_sec: f64,
    pub jump_cost: f64,
    pub regen_delay_ms: f64,
    pub death_frame_ms: f64,
    pub death_nudge_x: f64,
    pub death_nudge_y: f64,
    pub jump_frame_ms: f64,
    /// Walk frame delay at full speed, scaled up as the player slows down.
    pub walk_frame_base_ms: f64,
    pub walk_frame_floor_ms: f64,
    pub spawn_x: f64,
    /// Fractions of the viewport.
    pub width_ratio: f64,
    pub base_height_ratio: f64,
    pub ground_line_ratio: f64,
    pub left_boundary_ratio: f64,
    pub sprite_scale: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 3.0,
            acceleration: 1.2,
            sprint_multiplier: 2.0,
            friction: 0.8,
            stop_threshold: 0.5,
            jump_impulse: -18.0,
            gravity: 2.0,
            stamina_regen_per_sec: 10.0,
            run_cost_per_sec: 20.0,
            jump_cost: 15.0,
            regen_delay_ms: 1000.0,
            death_frame_ms: 200.0,
            death_nudge_x: 5.0,
            death_nudge_y: 10.0,
            jump_frame_ms: 12.0,
            walk_frame_base_ms: 12.0,
            walk_frame_floor_ms: 30.0,
            spawn_x: 100.0,
            width_ratio: 0.05,
            base_height_ratio: 0.15,
            ground_line_ratio: 0.75,
            left_boundary_ratio: 0.4,
            sprite_scale: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrowTuning {
    pub min_trigger_distance: u32,
    pub max_trigger_distance: u32,
    pub initial_speed: f64,
    /// Per second.
    pub flight_acceleration: f64,
    pub max_speed: f64,
    pub min_launch_angle_deg: f64,
    pub max_launch_angle_deg: f64,
    pub max_preflight_delay_ms: u32,
    pub max_flight_caw_delay_ms: u32,
    pub offscreen_margin: f64,
    pub min_flight_ms: f64,
    /// Per second, capped per tick by `max_walk_step`.
    pub walk_speed: f64,
    pub max_walk_step: f64,
    pub min_decision_ms: u32,
    pub max_decision_ms: u32,
    pub min_walk_ms: u32,
    pub max_walk_ms: u32,
    pub walk_probability: f64,
    pub caw_probability: f64,
    pub frame_ms: f64,
    pub min_group_size: u32,
    pub max_group_size: u32,
    pub min_group_spacing: u32,
    pub max_group_spacing: u32,
    pub min_perch_y: i32,
    pub max_perch_y: i32,
    pub perch_jitter: i32,
    pub first_frontier: f64,
    pub min_frontier_spacing: u32,
    pub max_frontier_spacing: u32,
    pub frontier_jitter: u32,
}

impl Default for CrowTuning {
    fn default() -> Self {
        Self {
            min_trigger_distance: 300,
            max_trigger_distance: 500,
            initial_speed: 15.0,
            flight_acceleration: 1.0,
            max_speed: 35.0,
            min_launch_angle_deg: 40.0,
            max_launch_angle_deg: 100.0,
            max_preflight_delay_ms: 500,
            max_flight_caw_delay_ms: 400,
            offscreen_margin: 100.0,
            min_flight_ms: 3000.0,
            walk_speed: 150.0,
            max_walk_step: 5.0,
            min_decision_ms: 2000,
            max_decision_ms: 5000,
            min_walk_ms: 1000,
            max_walk_ms: 3000,
            walk_probability: 0.1,
            caw_probability: 0.1,
            frame_ms: 100.0,
            min_group_size: 2,
            max_group_size: 4,
            min_group_spacing: 80,
            max_group_spacing: 130,
            min_perch_y: 650,
            max_perch_y: 730,
            perch_jitter: 20,
            first_frontier: 2000.0,
            min_frontier_spacing: 2500,
            max_frontier_spacing: 4000,
            frontier_jitter: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiderTuning {
    pub frame_ms: f64,
    /// Per tick, divided by `0.5 + scale / 2`.
    pub walk_speed: f64,
    pub aggro_initial_speed: f64,
    /// Per tick, divided by the spider's scale.
    pub aggro_acceleration: f64,
    /// Divided by `0.7 + scale / 8`.
    pub aggro_max_speed: f64,
    pub aggro_distance: f64,
    /// Multiplied by the spider's scale.
    pub stop_distance: f64,
    pub aggro_settle_ms: f64,
    pub walk_probability: f64,
    pub min_decision_ms: u32,
    pub max_decision_ms: u32,
    pub min_walk_ms: u32,
    pub max_walk_ms: u32,
    pub stop_probability: f64,
    pub min_stop_ms: u32,
    pub max_stop_ms: u32,
    pub min_after_jump_ms: u32,
    pub max_after_jump_ms: u32,
    /// Pixels per second squared, integrated at `jump_step_secs` per tick.
    pub jump_gravity: f64,
    pub jump_step_secs: f64,
    pub min_far_jump_check_ms: u32,
    pub max_far_jump_check_ms: u32,
    pub far_jump_probability: f64,
    pub far_jump_distance: f64,
    pub attack_trigger_window: f64,
    pub max_jump_range: f64,
    /// Multiplied by the spider's scale.
    pub min_attack_range: f64,
    pub attack_flight_ticks: f64,
    pub attack_arc_height: f64,
    pub attack_arc_ticks: f64,
    pub directional_flight_ticks: f64,
    pub min_directional_arc: i32,
    pub max_directional_arc: i32,
    /// Multiplied by the spider's scale, truncated.
    pub damage: f64,
    /// Multiplied by the spider's scale.
    pub hit_radius: f64,
    pub attack_limit: u32,
    pub twitch_ms: f64,
    pub twitch_base_ms: f64,
    pub twitch_growth: f64,
    pub twitch_jitter_ms: u32,
    pub fade_ms: f64,
    pub fade_distance: f64,
    pub reap_distance: f64,
    pub sound_max_distance: f64,
    pub sound_min_volume: f32,
}

impl Default for SpiderTuning {
    fn default() -> Self {
        Self {
            frame_ms: 50.0,
            walk_speed: 3.0,
            aggro_initial_speed: 2.0,
            aggro_acceleration: 0.01,
            aggro_max_speed: 3.5,
            aggro_distance: 500.0,
            stop_distance: 200.0,
            aggro_settle_ms: 200.0,
            walk_probability: 0.6,
            min_decision_ms: 2000,
            max_decision_ms: 5000,
            min_walk_ms: 1000,
            max_walk_ms: 2000,
            stop_probability: 0.01,
            min_stop_ms: 500,
            max_stop_ms: 1000,
            min_after_jump_ms: 300,
            max_after_jump_ms: 600,
            jump_gravity: 1700.0,
            jump_step_secs: 1.0 / 60.0,
            min_far_jump_check_ms: 2000,
            max_far_jump_check_ms: 3500,
            far_jump_probability: 0.1,
            far_jump_distance: 600.0,
            attack_trigger_window: 15.0,
            max_jump_range: 600.0,
            min_attack_range: 100.0,
            attack_flight_ticks: 27.0,
            attack_arc_height: -150.0,
            attack_arc_ticks: 40.0,
            directional_flight_ticks: 40.0,
            min_directional_arc: 110,
            max_directional_arc: 130,
            damage: 10.0,
            hit_radius: 30.0,
            attack_limit: 5,
            twitch_ms: 5000.0,
            twitch_base_ms: 200.0,
            twitch_growth: 0.0017,
            twitch_jitter_ms: 500,
            fade_ms: 2000.0,
            fade_distance: 500.0,
            reap_distance: 600.0,
            sound_max_distance: 1500.0,
            sound_min_volume: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Level1Tuning {
    pub scroll: ScrollTuning,
    pub player: PlayerTuning,
    pub crow: CrowTuning,
    pub spider: SpiderTuning,
}
