//! Level 1: the night forest.
//!
//! [`Level1Simulation`] owns the per-tick world; [`Level1Scene`] wraps it with
//! asset loading, audio and drawing for the engine loop.

pub mod assets;
mod context;
pub mod crow;
pub mod home_tree;
pub mod howls;
pub mod parallax;
pub mod player;
pub mod render;
pub mod scene;
pub mod scroll;
pub mod simulation;
pub mod spider;
pub mod tuning;

#[cfg(test)]
mod test_support;

pub use context::TickContext;
pub use crow::{Crow, CrowFlock, CrowFrames, CrowState};
pub use home_tree::HomeTree;
pub use parallax::{LayerId, LayerWidths, ParallaxField};
pub use player::{DamageSink, PlayerController, PlayerFrames, PlayerInput};
pub use scene::{Level1Scene, LEVEL1_SCENE_NAME};
pub use scroll::ScrollState;
pub use simulation::{Level1Setup, Level1Simulation, Level1SystemId, LEVEL1_SYSTEM_ORDER};
pub use spider::{Spider, SpiderFrames, SpiderState, SpiderSwarm};
pub use tuning::{CrowTuning, Level1Tuning, PlayerTuning, ScrollTuning, SpiderTuning};
