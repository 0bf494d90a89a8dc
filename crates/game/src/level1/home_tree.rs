use tracing::info;

pub const HOME_TREE_X: f64 = 8000.0;
pub const NEAR_DISTANCE: f64 = 300.0;
/// Gap between the tree base and the screen bottom, as a share of screen height.
pub const BASE_LIFT_RATIO: f64 = 0.065;

/// The forest spirit's tree: a fixed landmark the hero can walk up to.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeTree {
    world_x: f64,
    player_near: bool,
}

impl Default for HomeTree {
    fn default() -> Self {
        Self::new(HOME_TREE_X)
    }
}

impl HomeTree {
    pub fn new(world_x: f64) -> Self {
        Self {
            world_x,
            player_near: false,
        }
    }

    pub fn world_x(&self) -> f64 {
        self.world_x
    }

    pub fn player_near(&self) -> bool {
        self.player_near
    }

    pub fn reset(&mut self) {
        self.player_near = false;
    }

    pub fn update(&mut self, hero_world_x: f64) {
        let near = (self.world_x - hero_world_x).abs() <= NEAR_DISTANCE;
        if near == self.player_near {
            return;
        }
        self.player_near = near;
        if near {
            info!(hero_world_x, "home_tree_reached");
        } else {
            info!(hero_world_x, "home_tree_left");
        }
    }

    /// Screen y of the tree's bottom edge.
    pub fn base_y(screen_height: u32) -> i32 {
        let height = f64::from(screen_height);
        (height - (height * BASE_LIFT_RATIO).trunc()) as i32
    }
}
