//! Server network layer handling UDP communications and the simulation loop

use crate::clients::ClientManager;
use crate::world::World;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{timestamp_ms, DelayQueue, InputState, Packet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: u32,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the simulation loop to the sender task
#[derive(Debug)]
pub enum SendMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// Main server coordinating networking and the authoritative simulation.
///
/// Every inbound input and every outbound snapshot passes through a fixed
/// artificial delay, so a local setup behaves like a high-latency link.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    world: World,
    tick_duration: Duration,

    /// Inputs waiting out their artificial uplink delay
    inbound: DelayQueue<(u32, InputState)>,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    send_tx: mpsc::UnboundedSender<SendMessage>,
    send_rx: mpsc::UnboundedReceiver<SendMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        link_delay: Duration,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", addr);
        info!("Simulating {}ms one-way latency", link_delay.as_millis());

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (send_tx, send_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients, link_delay))),
            world: World::new(),
            tick_duration,
            inbound: DelayQueue::new(link_delay),
            server_tx,
            server_rx,
            send_tx,
            send_rx,
        })
    }

    /// Spawns the task that continuously listens for incoming datagrams
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Dropping malformed packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains the outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut send_rx = std::mem::replace(&mut self.send_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(SendMessage::SendPacket { packet, addr }) = send_rx.recv().await {
                if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                    error!("Failed to send packet to {}: {}", addr, e);
                }
            }
        });
    }

    /// Spawns the task that watches for silent clients
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts(CLIENT_TIMEOUT)
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn queue_send(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.send_tx.send(SendMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Dispatches one decoded inbound packet.
    ///
    /// The connect/disconnect handshake is handled immediately; gameplay
    /// inputs are parked in the inbound delay queue and only reach the
    /// world once their artificial delay has elapsed.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                // A reconnect from the same address replaces the old entry.
                let existing = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };
                if let Some(existing_id) = existing {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    self.clients.write().await.remove_client(&existing_id);
                    self.world.remove_player(&existing_id);
                }

                let player_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                match player_id {
                    Some(player_id) => {
                        self.world.add_player(player_id);
                        // The handshake ack is not artificially delayed;
                        // only gameplay traffic is.
                        self.queue_send(Packet::Connected { player_id }, addr);
                    }
                    None => {
                        self.queue_send(
                            Packet::Disconnected {
                                reason: "Server full".to_string(),
                            },
                            addr,
                        );
                    }
                }
            }

            Packet::Input {
                direction,
                timestamp,
            } => {
                let player_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(player_id) = player_id {
                    self.clients.write().await.touch(player_id);
                    self.inbound.enqueue(
                        (
                            player_id,
                            InputState {
                                direction,
                                timestamp,
                            },
                        ),
                        Instant::now(),
                    );
                } else {
                    warn!("Input from unknown address {}", addr);
                }
            }

            Packet::Disconnect => {
                let player_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(player_id) = player_id {
                    self.clients.write().await.remove_client(&player_id);
                    self.world.remove_player(&player_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// One fixed-rate simulation tick.
    ///
    /// Drains the inputs whose uplink delay has elapsed, steps the world by
    /// a constant dt, and fans the resulting snapshot into every client's
    /// delayed downlink. Drift from a slow tick is absorbed by the interval
    /// shortening its next sleep; dt stays constant and the world never
    /// steps twice per wake.
    async fn tick(&mut self, dt: f32) {
        let now = Instant::now();

        let inputs = self.inbound.drain_ready(now);
        self.world.step(dt, &inputs);

        let ready = {
            let mut clients = self.clients.write().await;
            if !clients.is_empty() {
                let snapshot = Packet::Snapshot(self.world.snapshot(timestamp_ms()));
                clients.queue_snapshot(&snapshot, now);
            }
            clients.drain_ready_snapshots(now)
        };

        for (addr, packet) in ready {
            self.queue_send(packet, addr);
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);
        let dt = self.tick_duration.as_secs_f32();

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            self.world.remove_player(&client_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.tick(dt).await;

                    if self.world.tick % 60 == 0 {
                        let client_count = self.clients.read().await.len();
                        if client_count > 0 {
                            debug!(
                                "Tick {}: {} clients, {} inputs in flight",
                                self.world.tick, client_count, self.inbound.len()
                            );
                        }
                    }
                },
            }
        }

        Ok(())
    }
}
