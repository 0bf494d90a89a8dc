use castle_engine::{Canvas, InputSnapshot, Scene, SceneCommand, SceneKey, SceneServices};
use tracing::info;

const DIM_COLOR: [u8; 4] = [0, 0, 0, 150];

/// Overlay shown over the frozen level. Escape returns to it, Q quits the game.
#[derive(Debug, Default)]
pub struct PauseScene {
    shown_ticks: u64,
}

impl PauseScene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scene for PauseScene {
    fn load(&mut self, _services: &mut SceneServices) {
        self.shown_ticks = 0;
        info!(scene = "pause", "scene_loaded");
    }

    fn update(
        &mut self,
        _dt_ms: f64,
        input: &InputSnapshot,
        _services: &mut SceneServices,
    ) -> SceneCommand {
        self.shown_ticks += 1;
        if input.quit_pressed() {
            info!(scene = "pause", "quit_requested");
            return SceneCommand::Quit;
        }
        if input.pause_pressed() {
            return SceneCommand::SwitchTo(SceneKey::Primary);
        }
        SceneCommand::None
    }

    fn render(&mut self, canvas: &mut Canvas<'_>) {
        let (width, height) = (canvas.width(), canvas.height());
        canvas.fill_rect(0, 0, width, height, DIM_COLOR);
    }

    fn unload(&mut self, _services: &mut SceneServices) {
        info!(scene = "pause", ticks = self.shown_ticks, "scene_unload");
    }

    fn debug_title(&self) -> Option<String> {
        Some("White Castle | Paused".to_string())
    }
}
