mod audio;
mod frames;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use audio::{open_audio, AudioSink, LoopHandle, RodioAudio, SilentAudio};
pub use frames::{FrameCache, FrameRequest, FrameSet, Sizing, Sprite, Tint};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    snap_px, world_to_screen_x, BlitOptions, Canvas, RenderError, Renderer, Viewport,
};
pub use scene::{Scene, SceneCommand, SceneKey, SceneServices};
