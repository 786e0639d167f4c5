use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub mod delay;

pub use delay::DelayQueue;

pub const TICK_RATE: u32 = 60;
pub const ARTIFICIAL_DELAY_MS: u64 = 200;
pub const RENDER_DELAY_MS: u64 = 100;
pub const INPUT_KEEPALIVE_MS: u64 = 200;
pub const MIN_PLAYERS: usize = 2;
pub const WORLD_WIDTH: f32 = 800.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const PLAYER_SPEED: f32 = 300.0;
pub const PLAYER_RADIUS: f32 = 20.0;
pub const COIN_RADIUS: f32 = 10.0;
pub const COIN_SPAWN_INTERVAL: f32 = 3.0;

/// Current wall-clock time in milliseconds since the epoch.
///
/// Both sides of the wire stamp messages with this clock; the client maps
/// it onto its own receive clock when choosing a render time.
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

/// A player's directional intent, as sampled from the keyboard.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    Idle,
}

impl Direction {
    /// Velocity in pixels per second for this intent.
    pub fn velocity(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -PLAYER_SPEED),
            Direction::Down => (0.0, PLAYER_SPEED),
            Direction::Left => (-PLAYER_SPEED, 0.0),
            Direction::Right => (PLAYER_SPEED, 0.0),
            Direction::Idle => (0.0, 0.0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    Input {
        direction: Direction,
        timestamp: u64,
    },
    Disconnect,

    Connected {
        player_id: u32,
    },
    Snapshot(Snapshot),
    Disconnected {
        reason: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub score: u32,
}

impl Player {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y, score: 0 }
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Coin {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub active: bool,
}

/// Full copy of the authoritative world at one tick.
///
/// Emitted by the server in non-decreasing timestamp order; the client
/// buffers these and renders a blend of two of them slightly in the past.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Snapshot {
    pub timestamp: u64,
    pub players: Vec<Player>,
    pub coins: Vec<Coin>,
}

/// A single timestamped input as it travels server-side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputState {
    pub direction: Direction,
    pub timestamp: u64,
}
