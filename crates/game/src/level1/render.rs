use castle_engine::{snap_px, world_to_screen_x, BlitOptions, Canvas, Sprite};

use super::assets::Level1Assets;
use super::home_tree::HomeTree;
use super::parallax::LayerId;
use super::player::PlayerController;
use super::simulation::Level1Simulation;

/// Share of the screen width every parallax strip is shifted left by.
const LAYER_SHIFT_RATIO: f64 = 0.2930;
const GROUND_SHIFT_PX: i32 = 300;
const HUD_BAR_HEIGHT: u32 = 6;
const HUD_BAR_SPACING: i32 = 3;
const HUD_RISE_PX: i32 = 45;
const HUD_BACKGROUND: [u8; 4] = [30, 30, 30, 120];
const HUD_FILL_ALPHA: u8 = 180;
const MISSING_PLAYER_COLOR: [u8; 4] = [255, 0, 0, 255];

/// Draw passes, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    Sky,
    FarFog,
    FarTrees,
    NearFog,
    Ground,
    NearTrees,
    HomeTree,
    Crows,
    Spiders,
    Player,
    ForegroundFog,
}

pub const RENDER_ORDER: [RenderPass; 11] = [
    RenderPass::Sky,
    RenderPass::FarFog,
    RenderPass::FarTrees,
    RenderPass::NearFog,
    RenderPass::Ground,
    RenderPass::NearTrees,
    RenderPass::HomeTree,
    RenderPass::Crows,
    RenderPass::Spiders,
    RenderPass::Player,
    RenderPass::ForegroundFog,
];

/// Vertical placement of a parallax strip as a share of screen height.
fn layer_top_ratio(id: LayerId) -> f64 {
    match id {
        LayerId::FarFog | LayerId::NearFog => 0.0810,
        LayerId::FarTrees => 0.0347,
        LayerId::NearTrees => 0.0579,
        LayerId::Ground => 0.0,
    }
}

pub fn render_level1(canvas: &mut Canvas<'_>, sim: &Level1Simulation, assets: &Level1Assets) {
    canvas.clear([0, 0, 0, 255]);
    for pass in RENDER_ORDER {
        draw_pass(canvas, pass, sim, assets);
    }
}

fn draw_pass(
    canvas: &mut Canvas<'_>,
    pass: RenderPass,
    sim: &Level1Simulation,
    assets: &Level1Assets,
) {
    let offset = sim.scroll_offset();
    match pass {
        RenderPass::Sky => {
            if let Some(sky) = assets.sky.as_deref() {
                canvas.blit(sky, 0, 0, BlitOptions::default());
            }
        }
        RenderPass::FarFog | RenderPass::ForegroundFog => {
            draw_layer(canvas, sim, assets, LayerId::FarFog)
        }
        RenderPass::FarTrees => draw_layer(canvas, sim, assets, LayerId::FarTrees),
        RenderPass::NearFog => draw_layer(canvas, sim, assets, LayerId::NearFog),
        RenderPass::Ground => draw_ground(canvas, sim, assets),
        RenderPass::NearTrees => draw_layer(canvas, sim, assets, LayerId::NearTrees),
        RenderPass::HomeTree => {
            if let Some(tree) = assets.home_tree.as_deref() {
                let x = snap_px(world_to_screen_x(sim.home_tree().world_x(), offset));
                let y = HomeTree::base_y(canvas.height()) - tree.height() as i32;
                canvas.blit(tree, x, y, BlitOptions::default());
            }
        }
        RenderPass::Crows => {
            for crow in sim.crows().crows() {
                if crow.is_off_screen() {
                    continue;
                }
                if let Some(sprite) = crow.current_sprite() {
                    let x = snap_px(world_to_screen_x(crow.x(), offset));
                    canvas.blit(
                        sprite,
                        x,
                        snap_px(crow.y()),
                        BlitOptions::flipped(crow.flipped()),
                    );
                }
            }
        }
        RenderPass::Spiders => {
            for spider in sim.spiders().spiders_by_depth() {
                let Some(sprite) = spider.current_sprite() else {
                    continue;
                };
                let x = snap_px(world_to_screen_x(spider.x(), offset));
                let y = snap_px(spider.y() - sprite.height() as f64);
                let options =
                    BlitOptions::flipped(spider.flipped()).with_opacity(spider.fade_alpha());
                canvas.blit(sprite, x, y, options);
            }
        }
        RenderPass::Player => draw_player(canvas, sim.player()),
    }
}

fn draw_layer(
    canvas: &mut Canvas<'_>,
    sim: &Level1Simulation,
    assets: &Level1Assets,
    id: LayerId,
) {
    let Some(texture) = assets.layer(id) else {
        return;
    };
    let shift = snap_px(canvas.width() as f64 * LAYER_SHIFT_RATIO);
    let y = snap_px(canvas.height() as f64 * layer_top_ratio(id));
    draw_tiles(canvas, texture, sim.parallax().layer(id).positions(), shift, y);
}

fn draw_ground(canvas: &mut Canvas<'_>, sim: &Level1Simulation, assets: &Level1Assets) {
    let Some(texture) = assets.layer(LayerId::Ground) else {
        return;
    };
    let y = canvas.height() as i32 - texture.height() as i32;
    let positions = sim.parallax().layer(LayerId::Ground).positions();
    draw_tiles(canvas, texture, positions, GROUND_SHIFT_PX, y);
}

fn draw_tiles(canvas: &mut Canvas<'_>, texture: &Sprite, positions: &[f64], shift: i32, y: i32) {
    for position in positions {
        canvas.blit(texture, snap_px(*position) - shift, y, BlitOptions::default());
    }
}

/// Sprite bottom-centered on the collision rect, then the status bars above it.
fn draw_player(canvas: &mut Canvas<'_>, player: &PlayerController) {
    let geometry = player.geometry();
    let rect_x = snap_px(player.x());
    let rect_y = snap_px(player.y());
    let rect_width = geometry.rect_width as i32;
    let rect_height = geometry.rect_height as i32;
    let center_x = rect_x + rect_width / 2;

    match player.current_sprite() {
        Some(sprite) if sprite.width() > 0 => {
            let x = center_x - sprite.width() as i32 / 2;
            let y = rect_y + rect_height - sprite.height() as i32;
            canvas.blit(sprite, x, y, BlitOptions::flipped(player.facing_left()));
        }
        _ => canvas.fill_rect(
            rect_x,
            rect_y,
            rect_width.max(0) as u32,
            rect_height.max(0) as u32,
            MISSING_PLAYER_COLOR,
        ),
    }

    let bar_width = (geometry.rect_width * 0.5).trunc().max(0.0) as u32;
    let start_x = center_x - bar_width as i32 / 2;
    let start_y = rect_y - HUD_RISE_PX;
    for (row, bar) in player.hud_bars().iter().enumerate() {
        let y = start_y + row as i32 * (HUD_BAR_HEIGHT as i32 + HUD_BAR_SPACING);
        canvas.fill_rect(start_x, y, bar_width, HUD_BAR_HEIGHT, HUD_BACKGROUND);
        let fill = (bar_width as f64 * bar.ratio.clamp(0.0, 1.0)).trunc() as u32;
        let [r, g, b] = bar.color;
        canvas.fill_rect(start_x, y, fill, HUD_BAR_HEIGHT, [r, g, b, HUD_FILL_ALPHA]);
    }
}
