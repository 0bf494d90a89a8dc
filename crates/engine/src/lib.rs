use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
mod asset_keys;
mod save_io;
mod settings;

pub use app::{
    open_audio, run_app, snap_px, world_to_screen_x, AppError, AudioSink, BlitOptions, Canvas,
    FrameCache, FrameRequest, FrameSet, InputAction, InputSnapshot, LoopConfig,
    LoopMetricsSnapshot, LoopHandle, RenderError, Renderer, RodioAudio, Scene, SceneCommand,
    SceneKey, SceneServices, SilentAudio, Sizing, Sprite, Tint, Viewport, SLOW_FRAME_ENV_VAR,
};
pub use asset_keys::{validate_asset_key, AssetKeyError};
pub use save_io::{read_json_if_exists, write_bytes_atomic, write_json_atomic, SaveIoError};
pub use settings::{Settings, SETTINGS_FILE_NAME};

pub const ROOT_ENV_VAR: &str = "WHITE_CASTLE_ROOT";
pub const SAVE_DIR_ENV_VAR: &str = "WHITE_CASTLE_SAVE_DIR";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub asset_root: PathBuf,
    pub save_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create save directory at {path}: {source}")]
    CreateSaveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "WHITE_CASTLE_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/white_castle\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let asset_root = root.join("assets");
    let save_dir = resolve_save_dir(&root)?;

    fs::create_dir_all(&save_dir).map_err(|source| StartupError::CreateSaveDir {
        path: save_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        root,
        asset_root,
        save_dir,
    })
}

fn resolve_save_dir(root: &Path) -> Result<PathBuf, StartupError> {
    match env::var(SAVE_DIR_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => Ok(PathBuf::from(value)),
        Ok(_) | Err(env::VarError::NotPresent) => Ok(root.join("saves")),
        Err(source) => Err(StartupError::EnvVar {
            var: SAVE_DIR_ENV_VAR,
            source,
        }),
    }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
