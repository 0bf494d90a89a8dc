use castle_engine::{resolve_app_paths, AppPaths, LoopConfig, Scene, Settings, StartupError};
use tracing::info;
use tracing_subscriber::EnvFilter;
use white_castle::{Level1Scene, PauseScene};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) paths: AppPaths,
    pub(crate) primary: Box<dyn Scene>,
    pub(crate) overlay: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== White Castle Startup ===");

    let paths = resolve_app_paths()?;
    let settings = Settings::load_or_default(&paths.save_dir);
    let config = loop_config(&settings);
    info!(
        window_width = config.window_width,
        window_height = config.window_height,
        fullscreen = config.fullscreen,
        target_tps = config.target_tps,
        "loop_config"
    );

    Ok(AppWiring {
        config,
        paths,
        primary: Box::new(Level1Scene::new()),
        overlay: Box::new(PauseScene::new()),
    })
}

fn loop_config(settings: &Settings) -> LoopConfig {
    LoopConfig {
        window_width: settings.screen_width,
        window_height: settings.screen_height,
        fullscreen: settings.fullscreen,
        music_volume: settings.music_level(),
        sound_volume: settings.sound_level(),
        ..LoopConfig::default()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_drive_window_and_volumes() {
        let settings = Settings {
            screen_width: 1920,
            screen_height: 1080,
            fullscreen: false,
            music_volume: 10,
            sound_volume: 0,
        };
        let config = loop_config(&settings);
        assert_eq!((config.window_width, config.window_height), (1920, 1080));
        assert!(!config.fullscreen);
        assert_eq!(config.music_volume, 1.0);
        assert_eq!(config.sound_volume, 0.0);
        assert_eq!(config.logical_width, LoopConfig::default().logical_width);
    }
}
