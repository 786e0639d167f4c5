//! # Coin Dash Server Library
//!
//! Authoritative host for the coin-collecting game. The server owns the only
//! trusted copy of the world, advances it at a fixed tick rate, and streams
//! full state snapshots to every connected client.
//!
//! ## Latency simulation
//!
//! The defining feature of this server is that it injects a fixed artificial
//! delay on both directions of gameplay traffic. Inbound inputs are parked in
//! a delay queue before the simulation may see them, and outbound snapshots
//! sit in a per-client delay queue before they are put on the wire. This
//! makes a loopback setup behave like a ~200ms link, which is what the
//! client's time-shifted interpolation exists to smooth over.
//!
//! ## Module Organization
//!
//! ### World Module (`world`)
//! The authoritative world model: player positions and scores, coin
//! spawning and collection, and the fixed-dt step function. The world has
//! exactly one writer, the simulation loop; connection handlers only ever
//! feed it through queues.
//!
//! ### Clients Module (`clients`)
//! The connection roster: player id assignment, address routing, liveness
//! timeouts, and one outbound delay queue per link so a delayed snapshot
//! for one client never holds up another.
//!
//! ### Network Module (`network`)
//! UDP transport and the main loop: a receiver task decodes datagrams into
//! a channel, the `tokio::select!` loop dispatches them and runs the 60Hz
//! tick, and a sender task drains outgoing packets.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(16), // ~60Hz tick
//!         Duration::from_millis(200), // one-way artificial latency
//!         8,
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod clients;
pub mod network;
pub mod world;
