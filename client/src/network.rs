//! Client event loop: receive path, input path, render path

use crate::buffer::SnapshotBuffer;
use crate::input::{self, InputSender};
use crate::interp;
use crate::rendering::Renderer;
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use macroquad::prelude::{is_quit_requested, next_frame};
use shared::{timestamp_ms, Packet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex};
use tokio::time::interval;

/// Control events surfaced from the receive task to the main loop
#[derive(Debug)]
enum ClientEvent {
    Connected { player_id: u32 },
    Disconnected { reason: String },
}

pub struct Client {
    socket: Arc<UdpSocket>,
    server_addr: SocketAddr,
    player_id: Option<u32>,
    connected: bool,

    /// Written by the receive task, read by the render tick.
    buffer: Arc<Mutex<SnapshotBuffer>>,
    input: InputSender,
    renderer: Renderer,

    render_delay_ms: u64,
    latency_ms: u64,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        render_delay_ms: u64,
        latency_ms: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind("0.0.0.0:0").await?);
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            player_id: None,
            connected: false,
            buffer: Arc::new(Mutex::new(SnapshotBuffer::new())),
            input: InputSender::new(),
            renderer: Renderer::new(),
            render_delay_ms,
            latency_ms,
        })
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    /// Spawns the task that decodes inbound datagrams. Snapshots go
    /// straight into the shared buffer; control packets are forwarded to
    /// the main loop.
    fn spawn_receiver(&self) -> mpsc::UnboundedReceiver<ClientEvent> {
        let socket = Arc::clone(&self.socket);
        let buffer = Arc::clone(&self.buffer);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut datagram = [0u8; 2048];

            loop {
                match socket.recv_from(&mut datagram).await {
                    Ok((len, addr)) => match deserialize::<Packet>(&datagram[0..len]) {
                        Ok(Packet::Snapshot(snapshot)) => {
                            buffer.lock().await.push(snapshot, timestamp_ms());
                        }
                        Ok(Packet::Connected { player_id }) => {
                            if event_tx
                                .send(ClientEvent::Connected { player_id })
                                .is_err()
                            {
                                break;
                            }
                        }
                        Ok(Packet::Disconnected { reason }) => {
                            let _ = event_tx.send(ClientEvent::Disconnected { reason });
                            break;
                        }
                        Ok(_) => warn!("Unexpected packet type from server"),
                        Err(_) => warn!("Dropping malformed packet from {}", addr),
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });

        event_rx
    }

    fn handle_event(&mut self, event: ClientEvent) -> bool {
        match event {
            ClientEvent::Connected { player_id } => {
                info!("Connected! Player ID: {}", player_id);
                self.player_id = Some(player_id);
                self.connected = true;
                true
            }
            ClientEvent::Disconnected { reason } => {
                // Total connection loss is the one failure surfaced to the
                // user.
                error!("Disconnected by server: {}", reason);
                self.connected = false;
                self.player_id = None;
                false
            }
        }
    }

    async fn render_frame(&self) {
        let mut buffer = self.buffer.lock().await;
        let render_time = buffer.render_time(timestamp_ms(), self.render_delay_ms);

        let state = render_time.and_then(|t| interp::sample(&mut buffer, t, self.player_id));
        drop(buffer);

        match state {
            Some(state) => self.renderer.draw(&state, self.player_id, self.latency_ms),
            None => self.renderer.draw_connecting(),
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to server at {}...", self.server_addr);
        self.send_packet(&Packet::Connect { client_version: 1 })
            .await?;

        let mut event_rx = self.spawn_receiver();
        let mut input_interval = interval(Duration::from_millis(16));
        let mut render_interval = interval(Duration::from_millis(16));

        loop {
            if is_quit_requested() {
                break;
            }

            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Some(event) => {
                            if !self.handle_event(event) {
                                break;
                            }
                        }
                        None => break,
                    }
                },

                _ = input_interval.tick() => {
                    if self.connected {
                        let direction = input::sample_keys();
                        if let Some(input) = self.input.update(direction, Instant::now()) {
                            let packet = Packet::Input {
                                direction: input.direction,
                                timestamp: input.timestamp,
                            };
                            if let Err(e) = self.send_packet(&packet).await {
                                error!("Error sending input: {}", e);
                            }
                        }
                    }
                },

                _ = render_interval.tick() => {
                    self.render_frame().await;
                    next_frame().await;
                },
            }
        }

        if self.connected {
            let _ = self.send_packet(&Packet::Disconnect).await;
        }

        Ok(())
    }
}
