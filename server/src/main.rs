mod clients;
mod network;
mod world;

use clap::Parser;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Tick rate (simulation steps per second)
    #[arg(short, long, default_value_t = shared::TICK_RATE)]
    tick_rate: u32,

    /// Artificial one-way latency in milliseconds, applied to inputs and
    /// snapshots alike
    #[arg(short = 'l', long, default_value_t = shared::ARTIFICIAL_DELAY_MS)]
    delay: u64,

    /// Maximum number of concurrent clients
    #[arg(short, long, default_value = "8")]
    max_clients: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f64(1.0 / f64::from(args.tick_rate));
    let link_delay = Duration::from_millis(args.delay);

    info!("Starting server on {} at {}Hz", addr, args.tick_rate);

    let mut server =
        network::Server::new(&addr, tick_duration, link_delay, args.max_clients).await?;

    server.run().await?;

    Ok(())
}
