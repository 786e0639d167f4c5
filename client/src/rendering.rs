use crate::interp::RenderState;
use macroquad::prelude::*;
use shared::{COIN_RADIUS, PLAYER_RADIUS, WORLD_HEIGHT, WORLD_WIDTH};

const PLAYER_COLORS: [Color; 8] = [BLUE, RED, GREEN, PURPLE, ORANGE, SKYBLUE, MAGENTA, YELLOW];

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn draw(&self, state: &RenderState, local_id: Option<u32>, latency_ms: u64) {
        clear_background(Color::from_rgba(30, 30, 30, 255));

        if state.waiting {
            draw_text(
                "Waiting for more players...",
                WORLD_WIDTH / 2.0 - 120.0,
                WORLD_HEIGHT / 2.0,
                24.0,
                WHITE,
            );
        }

        for coin in &state.coins {
            if coin.active {
                draw_circle(coin.x, coin.y, COIN_RADIUS, GOLD);
            }
        }

        for player in &state.players {
            if Some(player.id) == local_id {
                draw_circle_lines(player.x, player.y, PLAYER_RADIUS + 2.0, 2.0, WHITE);
            }

            let color = PLAYER_COLORS[(player.id as usize).wrapping_sub(1) % PLAYER_COLORS.len()];
            draw_circle(player.x, player.y, PLAYER_RADIUS, color);

            draw_text(
                &player.score.to_string(),
                player.x - 5.0,
                player.y - PLAYER_RADIUS - 10.0,
                24.0,
                WHITE,
            );
        }

        draw_text(
            &format!("Simulated latency: ~{}ms each way", latency_ms),
            10.0,
            WORLD_HEIGHT - 10.0,
            18.0,
            GRAY,
        );
    }

    pub fn draw_connecting(&self) {
        clear_background(Color::from_rgba(30, 30, 30, 255));
        draw_text(
            "Connecting...",
            WORLD_WIDTH / 2.0 - 60.0,
            WORLD_HEIGHT / 2.0,
            24.0,
            WHITE,
        );
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
