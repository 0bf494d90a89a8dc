use std::path::{Path, PathBuf};

use tracing::info;

use super::audio::{AudioSink, SilentAudio};
use super::frames::FrameCache;
use super::input::InputSnapshot;
use super::rendering::{Canvas, Viewport};

/// The two scene slots the loop knows about.
///
/// `Overlay` is shown on top of a suspended `Primary` scene; switching to it
/// pauses `Primary` instead of unloading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Primary,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneCommand {
    #[default]
    None,
    SwitchTo(SceneKey),
    HardResetTo(SceneKey),
    Quit,
}

/// Shared services lent to scenes for the duration of a call.
pub struct SceneServices {
    pub audio: Box<dyn AudioSink>,
    pub frames: FrameCache,
    pub save_dir: PathBuf,
    pub logical_size: Viewport,
}

impl SceneServices {
    pub fn new(
        audio: Box<dyn AudioSink>,
        frames: FrameCache,
        save_dir: PathBuf,
        logical_size: Viewport,
    ) -> Self {
        Self {
            audio,
            frames,
            save_dir,
            logical_size,
        }
    }

    /// Silent audio and an asset root that may not exist; used by tests and tools.
    pub fn headless(asset_root: &Path, save_dir: &Path, logical_size: Viewport) -> Self {
        Self::new(
            Box::new(SilentAudio::default()),
            FrameCache::new(asset_root.to_path_buf()),
            save_dir.to_path_buf(),
            logical_size,
        )
    }
}

pub trait Scene {
    fn load(&mut self, services: &mut SceneServices);
    fn update(
        &mut self,
        dt_ms: f64,
        input: &InputSnapshot,
        services: &mut SceneServices,
    ) -> SceneCommand;
    fn render(&mut self, canvas: &mut Canvas<'_>);
    /// Called when an overlay takes over; the scene stays loaded.
    fn pause(&mut self, _services: &mut SceneServices) {}
    /// Called when the scene becomes active again after [`Scene::pause`].
    fn resume(&mut self, _services: &mut SceneServices) {}
    fn unload(&mut self, _services: &mut SceneServices) {}
    fn debug_title(&self) -> Option<String> {
        None
    }
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    is_loaded: bool,
}

impl SceneRuntime {
    fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            is_loaded: false,
        }
    }

    fn load(&mut self, services: &mut SceneServices) {
        self.scene.load(services);
        self.is_loaded = true;
    }

    fn unload(&mut self, services: &mut SceneServices) {
        if self.is_loaded {
            self.scene.unload(services);
            self.is_loaded = false;
        }
    }
}

pub(crate) struct SceneMachine {
    primary: SceneRuntime,
    overlay: SceneRuntime,
    active_scene: SceneKey,
}

impl SceneMachine {
    pub(crate) fn new(primary: Box<dyn Scene>, overlay: Box<dyn Scene>) -> Self {
        Self {
            primary: SceneRuntime::new(primary),
            overlay: SceneRuntime::new(overlay),
            active_scene: SceneKey::Primary,
        }
    }

    pub(crate) fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub(crate) fn load_active(&mut self, services: &mut SceneServices) {
        let runtime = self.active_runtime_mut();
        if !runtime.is_loaded {
            runtime.load(services);
        }
    }

    pub(crate) fn update_active(
        &mut self,
        dt_ms: f64,
        input: &InputSnapshot,
        services: &mut SceneServices,
    ) -> SceneCommand {
        self.active_runtime_mut()
            .scene
            .update(dt_ms, input, services)
    }

    /// Draws the suspended primary scene underneath an active overlay.
    pub(crate) fn render(&mut self, canvas: &mut Canvas<'_>) {
        if self.active_scene == SceneKey::Overlay && self.primary.is_loaded {
            self.primary.scene.render(canvas);
        }
        self.active_runtime_mut().scene.render(canvas);
    }

    pub(crate) fn debug_title_active(&self) -> Option<String> {
        self.runtime_ref(self.active_scene).scene.debug_title()
    }

    pub(crate) fn switch_to(&mut self, next_scene: SceneKey, services: &mut SceneServices) -> bool {
        if self.active_scene == next_scene {
            return false;
        }

        match next_scene {
            SceneKey::Overlay => {
                if self.primary.is_loaded {
                    self.primary.scene.pause(services);
                    info!(scene = ?SceneKey::Primary, "scene_paused");
                }
                self.overlay.unload(services);
                self.overlay.load(services);
            }
            SceneKey::Primary => {
                self.overlay.unload(services);
                if self.primary.is_loaded {
                    self.primary.scene.resume(services);
                    info!(scene = ?SceneKey::Primary, "scene_resumed");
                } else {
                    self.primary.load(services);
                }
            }
        }
        self.active_scene = next_scene;
        true
    }

    pub(crate) fn hard_reset_to(
        &mut self,
        next_scene: SceneKey,
        services: &mut SceneServices,
    ) -> bool {
        if next_scene == SceneKey::Primary {
            self.overlay.unload(services);
        }
        let runtime = self.runtime_mut(next_scene);
        runtime.unload(services);
        runtime.load(services);
        let changed = self.active_scene != next_scene;
        self.active_scene = next_scene;
        changed
    }

    pub(crate) fn shutdown_all(&mut self, services: &mut SceneServices) {
        self.overlay.unload(services);
        self.primary.unload(services);
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        self.runtime_mut(self.active_scene)
    }

    fn runtime_mut(&mut self, key: SceneKey) -> &mut SceneRuntime {
        match key {
            SceneKey::Primary => &mut self.primary,
            SceneKey::Overlay => &mut self.overlay,
        }
    }

    fn runtime_ref(&self, key: SceneKey) -> &SceneRuntime {
        match key {
            SceneKey::Primary => &self.primary,
            SceneKey::Overlay => &self.overlay,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type EventLog = Rc<RefCell<Vec<String>>>;

    struct RecordingScene {
        name: &'static str,
        events: EventLog,
        next_command: SceneCommand,
    }

    impl RecordingScene {
        fn boxed(name: &'static str, events: &EventLog) -> Box<dyn Scene> {
            Box::new(Self {
                name,
                events: Rc::clone(events),
                next_command: SceneCommand::None,
            })
        }

        fn record(&self, event: &str) {
            self.events.borrow_mut().push(format!("{}:{event}", self.name));
        }
    }

    impl Scene for RecordingScene {
        fn load(&mut self, _services: &mut SceneServices) {
            self.record("load");
        }

        fn update(
            &mut self,
            _dt_ms: f64,
            _input: &InputSnapshot,
            _services: &mut SceneServices,
        ) -> SceneCommand {
            self.record("update");
            self.next_command
        }

        fn render(&mut self, _canvas: &mut Canvas<'_>) {
            self.record("render");
        }

        fn pause(&mut self, _services: &mut SceneServices) {
            self.record("pause");
        }

        fn resume(&mut self, _services: &mut SceneServices) {
            self.record("resume");
        }

        fn unload(&mut self, _services: &mut SceneServices) {
            self.record("unload");
        }
    }

    struct MinimalScene;

    impl Scene for MinimalScene {
        fn load(&mut self, _services: &mut SceneServices) {}

        fn update(
            &mut self,
            _dt_ms: f64,
            _input: &InputSnapshot,
            _services: &mut SceneServices,
        ) -> SceneCommand {
            SceneCommand::Quit
        }

        fn render(&mut self, _canvas: &mut Canvas<'_>) {}
    }

    fn services() -> (tempfile::TempDir, SceneServices) {
        let temp = tempfile::tempdir().expect("tempdir");
        let services = SceneServices::headless(
            temp.path(),
            temp.path(),
            Viewport {
                width: 4,
                height: 4,
            },
        );
        (temp, services)
    }

    fn take(events: &EventLog) -> Vec<String> {
        events.borrow_mut().drain(..).collect()
    }

    #[test]
    fn overlay_pauses_primary_without_unloading_it() {
        let events = EventLog::default();
        let (_temp, mut services) = services();
        let mut machine = SceneMachine::new(
            RecordingScene::boxed("level", &events),
            RecordingScene::boxed("pause", &events),
        );
        machine.load_active(&mut services);
        take(&events);

        assert!(machine.switch_to(SceneKey::Overlay, &mut services));
        assert_eq!(take(&events), vec!["level:pause", "pause:load"]);

        assert!(machine.switch_to(SceneKey::Primary, &mut services));
        assert_eq!(take(&events), vec!["pause:unload", "level:resume"]);
        assert_eq!(machine.active_scene(), SceneKey::Primary);
    }

    #[test]
    fn switch_to_active_scene_is_noop() {
        let events = EventLog::default();
        let (_temp, mut services) = services();
        let mut machine = SceneMachine::new(
            RecordingScene::boxed("level", &events),
            RecordingScene::boxed("pause", &events),
        );
        machine.load_active(&mut services);
        take(&events);

        assert!(!machine.switch_to(SceneKey::Primary, &mut services));
        assert!(take(&events).is_empty());
    }

    #[test]
    fn overlay_render_draws_suspended_primary_first() {
        let events = EventLog::default();
        let (_temp, mut services) = services();
        let mut machine = SceneMachine::new(
            RecordingScene::boxed("level", &events),
            RecordingScene::boxed("pause", &events),
        );
        machine.load_active(&mut services);
        machine.switch_to(SceneKey::Overlay, &mut services);
        take(&events);

        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4).expect("canvas");
        machine.render(&mut canvas);
        assert_eq!(take(&events), vec!["level:render", "pause:render"]);
    }

    #[test]
    fn hard_reset_reloads_primary_and_drops_overlay() {
        let events = EventLog::default();
        let (_temp, mut services) = services();
        let mut machine = SceneMachine::new(
            RecordingScene::boxed("level", &events),
            RecordingScene::boxed("pause", &events),
        );
        machine.load_active(&mut services);
        machine.switch_to(SceneKey::Overlay, &mut services);
        take(&events);

        assert!(machine.hard_reset_to(SceneKey::Primary, &mut services));
        assert_eq!(
            take(&events),
            vec!["pause:unload", "level:unload", "level:load"]
        );
    }

    #[test]
    fn shutdown_unloads_only_loaded_scenes() {
        let events = EventLog::default();
        let (_temp, mut services) = services();
        let mut machine = SceneMachine::new(
            RecordingScene::boxed("level", &events),
            RecordingScene::boxed("pause", &events),
        );
        machine.load_active(&mut services);
        take(&events);

        machine.shutdown_all(&mut services);
        machine.shutdown_all(&mut services);
        assert_eq!(take(&events), vec!["level:unload"]);
    }

    #[test]
    fn default_lifecycle_hooks_are_noops() {
        let (_temp, mut services) = services();
        let mut machine = SceneMachine::new(Box::new(MinimalScene), Box::new(MinimalScene));
        machine.load_active(&mut services);
        assert!(machine.switch_to(SceneKey::Overlay, &mut services));
        assert!(machine.switch_to(SceneKey::Primary, &mut services));
        let command = machine.update_active(33.0, &InputSnapshot::empty(), &mut services);
        assert_eq!(command, SceneCommand::Quit);
        assert_eq!(machine.debug_title_active(), None);
    }
}
