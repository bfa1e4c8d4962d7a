//! Draws the world. No game logic lives here.

use crate::game::ClientWorld;
use macroquad::prelude::*;
use shared::PLAYER_RADIUS;

const BACKGROUND: Color = Color::new(0.08, 0.09, 0.11, 1.0);
const FALLBACK: Color = GRAY;

pub fn draw(world: &ClientWorld) {
    clear_background(BACKGROUND);

    for (_, entity) in world.entities() {
        let color = parse_color(&entity.color).unwrap_or(FALLBACK);
        draw_circle(entity.x, entity.y, PLAYER_RADIUS, color);

        if entity.is_local {
            draw_circle_lines(entity.x, entity.y, PLAYER_RADIUS + 2.0, 1.5, WHITE);
        }
    }

    draw_text(&format!("players: {}", world.len()), 10.0, 20.0, 20.0, WHITE);

    if world.local_id().is_none() {
        draw_text("connecting...", 10.0, 40.0, 20.0, LIGHTGRAY);
    }
}

/// Parses a `#rrggbb` hex string, the color format the server hands out.
pub fn parse_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;

    let r = ((value >> 16) & 0xff) as f32 / 255.0;
    let g = ((value >> 8) & 0xff) as f32 / 255.0;
    let b = (value & 0xff) as f32 / 255.0;
    Some(Color::new(r, g, b, 1.0))
}
