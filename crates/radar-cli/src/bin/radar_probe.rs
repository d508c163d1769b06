//! Headless radar client.
//!
//! Attaches to one airport, runs the tick loop and prints the traffic picture.

use std::time::Duration;

use clap::Parser;
use radar_cli::{traffic_line, AutoController};
use radar_sdk::RadarClient;
use tokio::time;

/// Attach to a radar server airport and watch its traffic
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Radar server address
    #[arg(long, default_value = "127.0.0.1:4444")]
    addr: String,

    /// Airport ICAO code (default: first available)
    #[arg(long)]
    airport: Option<String>,

    /// Radar screen width
    #[arg(long, default_value_t = 1200)]
    width: u32,

    /// Radar screen height
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Number of ticks before ending the session
    #[arg(long, default_value_t = 120)]
    ticks: u32,

    /// Tick interval in milliseconds
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Do not clear departures automatically
    #[arg(long)]
    manual: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Connecting to radar server at {}...", args.addr);
    let mut client = RadarClient::connect(&args.addr).await?;

    let available = client.list_airports().await?;
    println!("Available airports: {}", available.join(", "));

    let icao = match args.airport {
        Some(code) => code.to_uppercase(),
        None => match available.first() {
            Some(code) => code.clone(),
            None => anyhow::bail!("no airport available"),
        },
    };

    client.send_screen_size(args.width, args.height).await?;
    let airport = client.request_airport(&icao).await?;
    println!("Attached to {}", airport);
    println!("  Center: ({}, {})", airport.center.x, airport.center.y);
    for runway in airport.runways() {
        println!(
            "  Runway {:02}: ({}, {}) -> ({}, {})",
            runway.number, runway.start.x, runway.start.y, runway.end.x, runway.end.y
        );
    }
    println!();

    let controller = AutoController {
        auto_clear: !args.manual,
        ..AutoController::default()
    };
    let mut interval = time::interval(Duration::from_millis(args.interval_ms));

    for tick in 1..=args.ticks {
        interval.tick().await;

        let traffic = client.request_aircraft().await?;
        println!("[{:3}] {} aircraft", tick, traffic.len());
        for aircraft in &traffic {
            println!("      {}", traffic_line(aircraft));
        }

        let changes: Vec<_> = controller.next_modification(&traffic).into_iter().collect();
        if let Some(change) = changes.first() {
            println!("      -> instructing {}", change.call_sign);
        }
        client.send_modified(changes).await?;
    }

    client.end().await?;
    println!("\nSession ended, {} released.", icao);
    Ok(())
}
