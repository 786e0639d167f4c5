//! Time-shifted interpolation over buffered snapshots

use crate::buffer::SnapshotBuffer;
use shared::{Coin, Player, Snapshot, MIN_PLAYERS};

/// What the renderer draws for one frame.
#[derive(Debug, Clone)]
pub struct RenderState {
    pub players: Vec<Player>,
    pub coins: Vec<Coin>,
    /// True while the server is waiting for enough players to start.
    pub waiting: bool,
}

/// Computes the renderable world for `render_time`.
///
/// With two bracketing snapshots, positions are linearly blended by the
/// clamped fraction of `render_time` between their timestamps; scores and
/// coin active flags snap to the later snapshot. With only one snapshot in
/// range (buffer underrun or startup) that snapshot is rendered as-is;
/// motion is never fabricated. The viewer's own entity is exempt from the
/// time shift and drawn at its latest known authoritative position.
pub fn sample(
    buffer: &mut SnapshotBuffer,
    render_time: u64,
    local_id: Option<u32>,
) -> Option<RenderState> {
    let local_latest = local_id.and_then(|id| {
        buffer
            .newest()
            .and_then(|s| s.players.iter().find(|p| p.id == id).cloned())
    });

    let mut state = match buffer.bracket(render_time)? {
        (nearest, None) => RenderState {
            players: nearest.players.clone(),
            coins: nearest.coins.clone(),
            waiting: false,
        },
        (before, Some(after)) => blend(before, after, render_time),
    };

    if let Some(local) = local_latest {
        if let Some(slot) = state.players.iter_mut().find(|p| p.id == local.id) {
            *slot = local;
        }
    }

    state.waiting = state.players.len() < MIN_PLAYERS;
    Some(state)
}

fn blend(before: &Snapshot, after: &Snapshot, render_time: u64) -> RenderState {
    let span = after.timestamp.saturating_sub(before.timestamp);
    let f = if span > 0 {
        (render_time.saturating_sub(before.timestamp)) as f32 / span as f32
    } else {
        1.0
    }
    .clamp(0.0, 1.0);

    let players = after
        .players
        .iter()
        .map(|p_after| {
            match before.players.iter().find(|p| p.id == p_after.id) {
                Some(p_before) => Player {
                    id: p_after.id,
                    x: lerp(p_before.x, p_after.x, f),
                    y: lerp(p_before.y, p_after.y, f),
                    // Discrete fields snap, not blend.
                    score: p_after.score,
                },
                // A player that just appeared snaps into place.
                None => p_after.clone(),
            }
        })
        .collect();

    let coins = after
        .coins
        .iter()
        .map(|c_after| match before.coins.iter().find(|c| c.id == c_after.id) {
            Some(c_before) => Coin {
                id: c_after.id,
                x: lerp(c_before.x, c_after.x, f),
                y: lerp(c_before.y, c_after.y, f),
                active: c_after.active,
            },
            None => c_after.clone(),
        })
        .collect();

    RenderState {
        players,
        coins,
        waiting: false,
    }
}

fn lerp(a: f32, b: f32, f: f32) -> f32 {
    a + (b - a) * f
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn snapshot_with_x(timestamp: u64, xs: &[(u32, f32)]) -> Snapshot {
        Snapshot {
            timestamp,
            players: xs
                .iter()
                .map(|(id, x)| Player {
                    id: *id,
                    x: *x,
                    y: 300.0,
                    score: 0,
                })
                .collect(),
            coins: Vec::new(),
        }
    }

    fn buffer_with(snapshots: Vec<Snapshot>) -> SnapshotBuffer {
        let mut buffer = SnapshotBuffer::new();
        for s in snapshots {
            let t = s.timestamp;
            buffer.push(s, t);
        }
        buffer
    }

    #[test]
    fn test_fraction_zero_matches_before_exactly() {
        let mut buffer = buffer_with(vec![
            snapshot_with_x(100, &[(1, 10.0)]),
            snapshot_with_x(200, &[(1, 50.0)]),
        ]);

        let state = sample(&mut buffer, 100, None).unwrap();
        assert_eq!(state.players[0].x, 10.0);
    }

    #[test]
    fn test_fraction_one_matches_after_exactly() {
        let mut buffer = buffer_with(vec![
            snapshot_with_x(100, &[(1, 10.0)]),
            snapshot_with_x(200, &[(1, 50.0)]),
        ]);

        let state = sample(&mut buffer, 200, None).unwrap();
        assert_eq!(state.players[0].x, 50.0);
    }

    #[test]
    fn test_intermediate_fraction_is_linear() {
        let mut buffer = buffer_with(vec![
            snapshot_with_x(100, &[(1, 10.0)]),
            snapshot_with_x(200, &[(1, 50.0)]),
        ]);

        let state = sample(&mut buffer, 125, None).unwrap();
        assert_approx_eq!(state.players[0].x, 10.0 + 0.25 * 40.0, 1e-4);
    }

    #[test]
    fn test_sixty_hz_stream_blend() {
        // Snapshots at ~60Hz timestamps with x = 0, 1, 2; rendering at
        // t=120 lands between 116 and 133.
        let mut buffer = buffer_with(vec![
            snapshot_with_x(100, &[(1, 0.0)]),
            snapshot_with_x(116, &[(1, 1.0)]),
            snapshot_with_x(133, &[(1, 2.0)]),
        ]);

        let state = sample(&mut buffer, 120, None).unwrap();
        assert_approx_eq!(state.players[0].x, 1.24, 0.01);
    }

    #[test]
    fn test_single_snapshot_renders_unblended() {
        let mut buffer = buffer_with(vec![snapshot_with_x(100, &[(1, 42.0)])]);

        // No second snapshot yet; the t=100 state is rendered exactly.
        let state = sample(&mut buffer, 120, None).unwrap();
        assert_eq!(state.players[0].x, 42.0);
    }

    #[test]
    fn test_empty_buffer_yields_nothing() {
        let mut buffer = SnapshotBuffer::new();
        assert!(sample(&mut buffer, 100, None).is_none());
    }

    #[test]
    fn test_scores_snap_to_after_snapshot() {
        let mut before = snapshot_with_x(100, &[(1, 0.0)]);
        let mut after = snapshot_with_x(200, &[(1, 10.0)]);
        before.players[0].score = 1;
        after.players[0].score = 2;

        let mut buffer = buffer_with(vec![before, after]);
        let state = sample(&mut buffer, 150, None).unwrap();

        assert_eq!(state.players[0].score, 2);
    }

    #[test]
    fn test_coins_blend_position_and_snap_active_flag() {
        let coin = |x: f32, active: bool| Coin {
            id: 5,
            x,
            y: 100.0,
            active,
        };
        let mut before = snapshot_with_x(100, &[(1, 0.0), (2, 0.0)]);
        let mut after = snapshot_with_x(200, &[(1, 0.0), (2, 0.0)]);
        before.coins.push(coin(10.0, true));
        after.coins.push(coin(10.0, false));

        let mut buffer = buffer_with(vec![before, after]);
        let state = sample(&mut buffer, 150, None).unwrap();

        assert_eq!(state.coins[0].x, 10.0);
        assert!(!state.coins[0].active);
    }

    #[test]
    fn test_local_player_uses_latest_known_position() {
        let mut buffer = buffer_with(vec![
            snapshot_with_x(100, &[(1, 0.0), (2, 0.0)]),
            snapshot_with_x(200, &[(1, 10.0), (2, 10.0)]),
            snapshot_with_x(300, &[(1, 20.0), (2, 20.0)]),
        ]);

        let state = sample(&mut buffer, 150, Some(1)).unwrap();

        // The local entity snaps to the newest snapshot, everyone else is
        // blended in the past.
        assert_eq!(state.players.iter().find(|p| p.id == 1).unwrap().x, 20.0);
        assert_approx_eq!(
            state.players.iter().find(|p| p.id == 2).unwrap().x,
            5.0,
            1e-4
        );
    }

    #[test]
    fn test_waiting_flag_below_minimum_players() {
        let mut buffer = buffer_with(vec![snapshot_with_x(100, &[(1, 0.0)])]);
        let state = sample(&mut buffer, 100, None).unwrap();
        assert!(state.waiting);

        let mut buffer = buffer_with(vec![snapshot_with_x(100, &[(1, 0.0), (2, 5.0)])]);
        let state = sample(&mut buffer, 100, None).unwrap();
        assert!(!state.waiting);
    }
}
