//! Headless test client: connects, walks a square, prints snapshot summaries.
//!
//! Useful as the second participant when testing the server by hand, since
//! coins only spawn once two players are present.

use bincode::{deserialize, serialize};
use shared::{timestamp_ms, Direction, Packet};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::interval;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string())
        .parse()?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Bot socket bound to {}", socket.local_addr()?);

    let connect = serialize(&Packet::Connect { client_version: 1 })?;
    socket.send_to(&connect, server_addr).await?;
    println!("Sent connect request to {}", server_addr);

    // Walk a square: half a second per leg.
    let legs = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];
    let mut leg = 0;
    let mut input_timer = interval(Duration::from_millis(500));
    let mut buffer = [0u8; 2048];
    let mut player_id = None;
    let mut snapshots_seen = 0u32;

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buffer) => {
                let (len, _) = result?;
                match deserialize::<Packet>(&buffer[0..len]) {
                    Ok(Packet::Connected { player_id: id }) => {
                        println!("Connected as player {}", id);
                        player_id = Some(id);
                    }
                    Ok(Packet::Snapshot(snapshot)) => {
                        snapshots_seen += 1;
                        if snapshots_seen % 60 == 0 {
                            let me = player_id
                                .and_then(|id| snapshot.players.iter().find(|p| p.id == id));
                            match me {
                                Some(p) => println!(
                                    "t={} pos=({:.0}, {:.0}) score={} coins={}",
                                    snapshot.timestamp, p.x, p.y, p.score,
                                    snapshot.coins.len()
                                ),
                                None => println!(
                                    "t={} ({} players)",
                                    snapshot.timestamp,
                                    snapshot.players.len()
                                ),
                            }
                        }
                    }
                    Ok(Packet::Disconnected { reason }) => {
                        println!("Disconnected: {}", reason);
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(_) => println!("Received malformed packet"),
                }
            }

            _ = input_timer.tick() => {
                if player_id.is_some() {
                    let packet = Packet::Input {
                        direction: legs[leg % legs.len()],
                        timestamp: timestamp_ms(),
                    };
                    socket.send_to(&serialize(&packet)?, server_addr).await?;
                    leg += 1;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                println!("Disconnecting");
                socket.send_to(&serialize(&Packet::Disconnect)?, server_addr).await?;
                return Ok(());
            }
        }
    }
}
