//! # Coin Dash Client Library
//!
//! Viewer/controller for the coin-collecting game. The client never
//! simulates anything itself: it sends directional intents to the server
//! and renders the authoritative snapshots that come back.
//!
//! Because every snapshot arrives a fixed artificial delay late (and with
//! whatever jitter the network adds), the client does not draw the newest
//! snapshot directly. It buffers a short history and renders the world as
//! it was a fixed render delay ago, blending between the two snapshots that
//! bracket that moment. The render delay absorbs jitter; it does not hide
//! the link latency, which stays visible as input lag.
//!
//! ## Module Organization
//!
//! ### Buffer Module (`buffer`)
//! Ordered snapshot history with eviction, out-of-order arrival policy,
//! and the server-clock offset estimate.
//!
//! ### Interpolation Module (`interp`)
//! Turns a bracketing pair of snapshots into one renderable state:
//! positions blend, scores and coin flags snap, the local player is drawn
//! at its latest known position.
//!
//! ### Input Module (`input`)
//! Keyboard sampling plus the change-detection/keepalive logic that
//! decides when an intent goes on the wire.
//!
//! ### Network Module (`network`)
//! UDP socket, receive task, and the main select loop over control events,
//! input ticks, and render ticks.
//!
//! ### Rendering Module (`rendering`)
//! Macroquad drawing of players, coins, scores, and status text.

pub mod buffer;
pub mod input;
pub mod interp;
pub mod network;
pub mod rendering;
