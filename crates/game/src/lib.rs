pub mod hero;
pub mod level1;
pub mod pause;

pub use hero::{load_hero_stats, read_progress, save_hero, save_progress, HeroStats, Progress};
pub use level1::{Level1Scene, Level1Simulation};
pub use pause::PauseScene;
