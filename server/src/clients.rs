//! Connection management and per-link snapshot delay queues
//!
//! This module handles the server-side roster of connected participants:
//! - Connection lifecycle (connect, disconnect, timeout)
//! - Stable player id assignment and address tracking
//! - One outbound `DelayQueue` per link, so a snapshot queued for one
//!   participant never blocks or delays another's
//!
//! Inbound inputs go through a single shared delay queue owned by the
//! simulation loop; this module only manages the outbound direction.

use log::info;
use shared::{DelayQueue, Packet};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// One connected participant and its artificially delayed downlink.
#[derive(Debug)]
pub struct RemoteClient {
    /// Unique player id assigned at connect time
    pub id: u32,
    /// Network address for sending snapshots
    pub addr: SocketAddr,
    /// Last time we received any datagram from this client
    pub last_seen: Instant,
    /// Snapshots in flight on this link, each held for the fixed delay
    outbound: DelayQueue<Packet>,
}

impl RemoteClient {
    pub fn new(id: u32, addr: SocketAddr, link_delay: Duration) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            outbound: DelayQueue::new(link_delay),
        }
    }

    /// Marks the client as recently active.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Roster of connected clients with capacity enforcement.
///
/// Assigns fresh ids starting from 1, routes datagrams back to addresses,
/// and fans each authoritative snapshot out into every client's own delay
/// queue. Dropping a client drops its queue, which discards any snapshots
/// still in flight on that link.
pub struct ClientManager {
    clients: HashMap<u32, RemoteClient>,
    next_player_id: u32,
    max_clients: usize,
    link_delay: Duration,
}

impl ClientManager {
    pub fn new(max_clients: usize, link_delay: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            next_player_id: 1,
            max_clients,
            link_delay,
        }
    }

    /// Attempts to register a new connection.
    ///
    /// Returns `Some(player_id)` on success, `None` when the server is at
    /// capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let player_id = self.next_player_id;
        self.next_player_id += 1;

        info!("Client {} connected from {}", player_id, addr);
        self.clients
            .insert(player_id, RemoteClient::new(player_id, addr, self.link_delay));

        Some(player_id)
    }

    /// Removes a client, discarding snapshots still in flight on its link.
    /// Returns true if the client was present.
    pub fn remove_client(&mut self, player_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(player_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Refreshes a client's liveness timestamp.
    pub fn touch(&mut self, player_id: u32) {
        if let Some(client) = self.clients.get_mut(&player_id) {
            client.touch();
        }
    }

    /// Queues one snapshot for every connected client, each on its own
    /// delayed link.
    pub fn queue_snapshot(&mut self, packet: &Packet, now: Instant) {
        for client in self.clients.values_mut() {
            client.outbound.enqueue(packet.clone(), now);
        }
    }

    /// Releases every snapshot whose artificial delay has elapsed, paired
    /// with the address it should be sent to.
    pub fn drain_ready_snapshots(&mut self, now: Instant) -> Vec<(SocketAddr, Packet)> {
        let mut ready = Vec::new();
        for client in self.clients.values_mut() {
            for packet in client.outbound.drain_ready(now) {
                ready.push((client.addr, packet));
            }
        }
        ready
    }

    /// Removes clients that have gone silent and returns their ids so the
    /// world can drop their entries too. Input keepalives keep live
    /// clients visible here.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for player_id in &timed_out {
            self.remove_client(player_id);
        }

        timed_out
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
