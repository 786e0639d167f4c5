//! Local input sampling with change detection and keepalive

use macroquad::prelude::{is_key_down, KeyCode};
use shared::{timestamp_ms, Direction, InputState, INPUT_KEEPALIVE_MS};
use std::time::{Duration, Instant};

/// Reads the keyboard into a directional intent.
///
/// First match wins, in the same priority order the server expects
/// (up, down, left, right). Supports both WASD and arrow keys.
pub fn sample_keys() -> Direction {
    if is_key_down(KeyCode::W) || is_key_down(KeyCode::Up) {
        Direction::Up
    } else if is_key_down(KeyCode::S) || is_key_down(KeyCode::Down) {
        Direction::Down
    } else if is_key_down(KeyCode::A) || is_key_down(KeyCode::Left) {
        Direction::Left
    } else if is_key_down(KeyCode::D) || is_key_down(KeyCode::Right) {
        Direction::Right
    } else {
        Direction::Idle
    }
}

/// Decides when an intent is worth putting on the wire.
///
/// Messages are fire-and-forget: one is sent when the intent changes, and
/// a periodic keepalive repeats the current intent so a lost packet is
/// corrected by the next one (and so the server can tell we are alive).
pub struct InputSender {
    current: Direction,
    last_sent: Option<Instant>,
    keepalive: Duration,
}

impl InputSender {
    pub fn new() -> Self {
        Self {
            current: Direction::Idle,
            last_sent: None,
            keepalive: Duration::from_millis(INPUT_KEEPALIVE_MS),
        }
    }

    /// Returns a timestamped input message if `direction` should be sent
    /// now, either because it differs from the last sent intent or because
    /// the keepalive interval has elapsed.
    pub fn update(&mut self, direction: Direction, now: Instant) -> Option<InputState> {
        let changed = direction != self.current;
        let keepalive_due = match self.last_sent {
            Some(last) => now.duration_since(last) >= self.keepalive,
            None => true,
        };

        if !changed && !keepalive_due {
            return None;
        }

        self.current = direction;
        self.last_sent = Some(now);
        Some(InputState {
            direction,
            timestamp: timestamp_ms(),
        })
    }
}

impl Default for InputSender {
    fn default() -> Self {
        Self::new()
    }
}
