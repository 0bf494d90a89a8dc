use std::sync::Arc;

use castle_engine::{FrameCache, FrameRequest, Sizing, Sprite, Tint, Viewport};

use crate::hero::HeroStats;

use super::crow::CrowFrames;
use super::parallax::{LayerId, LayerWidths};
use super::player::PlayerFrames;
use super::spider::SpiderFrames;
use super::tuning::PlayerTuning;

pub const SKY_KEY: &str = "level_1/bg/sky";
pub const HOME_TREE_KEY: &str = "level_1/home_tree/home_tree";
pub const MUSIC_KEY: &str = "scene/hero_creator/dark_wood";

/// Art is authored for this logical height.
const DESIGN_HEIGHT: f32 = 900.0;

pub fn layer_key(id: LayerId) -> &'static str {
    match id {
        LayerId::FarFog => "level_1/bg_create/fog2",
        LayerId::FarTrees => "level_1/bg_create/bg_trees2",
        LayerId::NearFog => "level_1/bg_create/fog",
        LayerId::Ground => "level_1/bg_create/ground",
        LayerId::NearTrees => "level_1/bg_create/bg_trees",
    }
}

fn design_scale(viewport: Viewport) -> Sizing {
    Sizing::scale(viewport.height as f32 / DESIGN_HEIGHT)
}

/// Static level art: sky, the five parallax textures and the home tree.
///
/// Missing images stay `None` and are skipped when drawing.
#[derive(Debug, Clone, Default)]
pub struct Level1Assets {
    pub sky: Option<Arc<Sprite>>,
    pub layers: [Option<Arc<Sprite>>; 5],
    pub home_tree: Option<Arc<Sprite>>,
}

impl Level1Assets {
    pub fn load(cache: &mut FrameCache, viewport: Viewport) -> Self {
        let sizing = design_scale(viewport);
        let image = |cache: &mut FrameCache, key: &str| {
            cache.image(&FrameRequest::new(key).sized(sizing))
        };
        let mut layers: [Option<Arc<Sprite>>; 5] = Default::default();
        for (slot, id) in layers.iter_mut().zip(LayerId::ALL) {
            *slot = image(cache, layer_key(id));
        }
        Self {
            sky: image(cache, SKY_KEY),
            layers,
            home_tree: image(cache, HOME_TREE_KEY),
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&Sprite> {
        LayerId::ALL
            .iter()
            .position(|candidate| *candidate == id)
            .and_then(|index| self.layers[index].as_deref())
    }

    /// Tile widths for the parallax strips; a missing texture tiles at the screen width.
    pub fn layer_widths(&self, viewport: Viewport) -> LayerWidths {
        let mut widths = LayerWidths::uniform(viewport.width as f64);
        for id in LayerId::ALL {
            if let Some(sprite) = self.layer(id) {
                widths.set(id, sprite.width() as f64);
            }
        }
        widths
    }
}

/// Walk, jump and death sequences for the hero's look, scaled to the
/// standing height and night-tinted.
pub fn player_frames(
    cache: &mut FrameCache,
    hero: &HeroStats,
    viewport: Viewport,
    tuning: &PlayerTuning,
) -> PlayerFrames {
    let base_height = (viewport.height as f64 * tuning.base_height_ratio).trunc();
    let target_height = (base_height * tuning.sprite_scale).trunc() as u32;
    let root = hero.sprite_root();
    let mut sequence = |action: &str| {
        cache.sequence(
            &FrameRequest::new(format!("{root}/{action}"))
                .sized(Sizing::Height(target_height))
                .tinted(Tint::Night),
        )
    };
    PlayerFrames {
        walk: sequence("walk"),
        jump: sequence("jump"),
        dead: sequence("dead"),
    }
}

pub fn crow_frames(cache: &mut FrameCache, viewport: Viewport) -> CrowFrames {
    let sizing = design_scale(viewport);
    let mut sequence = |key: &str| cache.sequence(&FrameRequest::new(key).sized(sizing));
    CrowFrames {
        idle: sequence("level_1/crow/idle"),
        walk: sequence("level_1/crow/walk"),
        caw: sequence("level_1/crow/idle/caw"),
        fly: sequence("level_1/crow/fly"),
    }
}

/// Spider sequences at `scale`; spiders of the same size share frames through the cache.
pub fn spider_frames(cache: &mut FrameCache, viewport: Viewport, scale: f64) -> SpiderFrames {
    let factor = scale as f32 * viewport.height as f32 / DESIGN_HEIGHT;
    let sizing = Sizing::scale(factor);
    let mut sequence = |animation: &str| {
        cache.sequence(&FrameRequest::new(format!("level_1/spider/{animation}")).sized(sizing))
    };
    SpiderFrames {
        stay: sequence("stay"),
        walk: sequence("walk"),
        attack: sequence("atack"),
        jump: sequence("jump"),
        dead: sequence("dead"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            width: 1440,
            height: 900,
        }
    }

    #[test]
    fn missing_art_falls_back_to_screen_width_tiles() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut cache = FrameCache::new(temp.path().to_path_buf());
        let assets = Level1Assets::load(&mut cache, viewport());
        assert!(assets.sky.is_none());
        assert!(assets.layer(LayerId::Ground).is_none());
        assert_eq!(assets.layer_widths(viewport()), LayerWidths::uniform(1440.0));
    }

    #[test]
    fn missing_sequences_load_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut cache = FrameCache::new(temp.path().to_path_buf());
        let player = player_frames(
            &mut cache,
            &HeroStats::default(),
            viewport(),
            &PlayerTuning::default(),
        );
        assert!(player.walk.is_empty());
        let spider = spider_frames(&mut cache, viewport(), 0.6);
        assert!(spider.dead.is_empty());
    }

    #[test]
    fn same_scale_spiders_share_frames() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut cache = FrameCache::new(temp.path().to_path_buf());
        let first = spider_frames(&mut cache, viewport(), 0.4);
        let second = spider_frames(&mut cache, viewport(), 0.4);
        assert!(Arc::ptr_eq(&first.walk, &second.walk));
    }

    #[test]
    fn layer_keys_are_valid_asset_keys() {
        for id in LayerId::ALL {
            assert!(castle_engine::validate_asset_key(layer_key(id)).is_ok());
        }
    }
}
