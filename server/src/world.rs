use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    Coin, Direction, InputState, Player, Snapshot, COIN_RADIUS, COIN_SPAWN_INTERVAL, MIN_PLAYERS,
    PLAYER_RADIUS, WORLD_HEIGHT, WORLD_WIDTH,
};
use std::collections::HashMap;

/// Server-side view of one player: the wire state plus the intent that
/// drives it between snapshots.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub player: Player,
    pub intent: Direction,
    pub last_input_timestamp: u64,
}

/// The authoritative world. Exactly one writer: the simulation loop.
///
/// All other components talk to it through queued inputs; nothing mutates
/// it from a connection-handling path.
pub struct World {
    pub tick: u32,
    players: HashMap<u32, PlayerState>,
    coins: Vec<Coin>,
    next_coin_id: u32,
    coin_spawn_timer: f32,
    rng: StdRng,
}

impl World {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Seeded constructor so tests get a deterministic world.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tick: 0,
            players: HashMap::new(),
            coins: Vec::new(),
            next_coin_id: 0,
            coin_spawn_timer: 0.0,
            rng,
        }
    }

    pub fn add_player(&mut self, id: u32) {
        let x = self.rng.gen_range(100.0..WORLD_WIDTH - 100.0);
        let y = self.rng.gen_range(100.0..WORLD_HEIGHT - 100.0);

        info!("Added player {} at ({:.0}, {:.0})", id, x, y);
        self.players.insert(
            id,
            PlayerState {
                player: Player::new(id, x, y),
                intent: Direction::Idle,
                last_input_timestamp: 0,
            },
        );
    }

    pub fn remove_player(&mut self, id: &u32) {
        if self.players.remove(id).is_some() {
            info!("Removed player {}", id);
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn players(&self) -> &HashMap<u32, PlayerState> {
        &self.players
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    /// Stores a player's intent. Inputs carry the client send timestamp;
    /// anything older than the last applied input for that player is stale
    /// and silently discarded.
    pub fn apply_input(&mut self, id: u32, input: InputState) {
        if let Some(state) = self.players.get_mut(&id) {
            if input.timestamp >= state.last_input_timestamp {
                state.intent = input.direction;
                state.last_input_timestamp = input.timestamp;
            } else {
                debug!(
                    "Discarding stale input for player {} ({} < {})",
                    id, input.timestamp, state.last_input_timestamp
                );
            }
        }
    }

    /// Advances the world by one fixed time slice.
    ///
    /// Applies the inputs that became ready this tick, then integrates
    /// movement, clamps to the world bounds and resolves coin pickups.
    /// Below the minimum player count the world sits in lobby mode: no
    /// movement, no coins.
    pub fn step(&mut self, dt: f32, inputs: &[(u32, InputState)]) {
        for (id, input) in inputs {
            self.apply_input(*id, *input);
        }

        self.tick = self.tick.wrapping_add(1);

        if self.player_count() < MIN_PLAYERS {
            if !self.coins.is_empty() {
                info!("Not enough players, clearing coins");
                self.coins.clear();
            }
            self.coin_spawn_timer = 0.0;
            return;
        }

        self.coin_spawn_timer += dt;
        if self.coin_spawn_timer >= COIN_SPAWN_INTERVAL {
            self.coin_spawn_timer = 0.0;
            self.spawn_coin();
        }

        for state in self.players.values_mut() {
            let (vel_x, vel_y) = state.intent.velocity();
            state.player.x += vel_x * dt;
            state.player.y += vel_y * dt;

            state.player.x = state.player.x.clamp(PLAYER_RADIUS, WORLD_WIDTH - PLAYER_RADIUS);
            state.player.y = state.player.y.clamp(PLAYER_RADIUS, WORLD_HEIGHT - PLAYER_RADIUS);
        }

        self.collect_coins();
    }

    fn spawn_coin(&mut self) {
        let coin = Coin {
            id: self.next_coin_id,
            x: self.rng.gen_range(COIN_RADIUS..WORLD_WIDTH - COIN_RADIUS),
            y: self.rng.gen_range(COIN_RADIUS..WORLD_HEIGHT - COIN_RADIUS),
            active: true,
        };
        debug!("Spawned coin {} at ({:.0}, {:.0})", coin.id, coin.x, coin.y);
        self.next_coin_id += 1;
        self.coins.push(coin);
    }

    fn collect_coins(&mut self) {
        for coin in &mut self.coins {
            if !coin.active {
                continue;
            }

            for state in self.players.values_mut() {
                if state.player.distance_to(coin.x, coin.y) < PLAYER_RADIUS + COIN_RADIUS {
                    coin.active = false;
                    state.player.score += 1;
                    info!(
                        "Player {} collected coin {}. Score: {}",
                        state.player.id, coin.id, state.player.score
                    );
                    break;
                }
            }
        }

        self.coins.retain(|coin| coin.active);
    }

    /// Full copy of the current state, tagged with the authoritative
    /// timestamp. Players are listed in id order so identical worlds
    /// produce identical snapshots.
    pub fn snapshot(&self, timestamp: u64) -> Snapshot {
        let mut players: Vec<Player> = self
            .players
            .values()
            .map(|state| state.player.clone())
            .collect();
        players.sort_by_key(|player| player.id);

        Snapshot {
            timestamp,
            players,
            coins: self.coins.clone(),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
