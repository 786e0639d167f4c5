mod buffer;
mod input;
mod interp;
mod network;
mod rendering;

use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Render delay in milliseconds (jitter absorption, rendered "in the
    /// past")
    #[arg(short = 'r', long, default_value_t = shared::RENDER_DELAY_MS)]
    render_delay: u64,

    /// One-way artificial latency the server was started with, shown in
    /// the UI
    #[arg(short = 'l', long, default_value_t = shared::ARTIFICIAL_DELAY_MS)]
    latency: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Rendering {}ms in the past", args.render_delay);
    info!("Controls: WASD or arrow keys to move");

    let mut client =
        network::Client::new(&args.server, args.render_delay, args.latency).await?;

    client.run().await?;

    Ok(())
}
