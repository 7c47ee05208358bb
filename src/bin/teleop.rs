//! Publishes velocity commands to a running race game.
//!
//! ```text
//! teleop --topic player1/cmd_vel --x 5 --count 60 --rate 60
//! ```

use std::error::Error;
use std::time::Duration;

use bevy::log::info;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use race_game::messaging::{Twist, UdpPublisher};

#[derive(Parser, Debug)]
#[command(name = "teleop", about = "Send planar velocity commands to the race game")]
struct Args {
    /// Address the game listens on
    #[arg(long, default_value = "127.0.0.1:7400")]
    addr: String,

    /// Topic to publish on
    #[arg(long, default_value = "player1/cmd_vel")]
    topic: String,

    /// Linear x velocity in pixels per tick
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    x: f64,

    /// Linear y velocity in pixels per tick (positive is down)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    y: f64,

    /// Number of messages to send
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Messages per second
    #[arg(long, default_value_t = 10.0)]
    rate: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let publisher = UdpPublisher::connect(args.addr.as_str())?;
    let twist = Twist::planar(args.x, args.y);
    let period = Duration::from_secs_f64(1.0 / args.rate.max(0.001));

    for i in 0..args.count {
        publisher.publish(&args.topic, twist)?;
        if i + 1 < args.count {
            std::thread::sleep(period);
        }
    }

    info!("Sent {} command(s) ({}, {}) on '{}' to {}", args.count, args.x, args.y, args.topic, args.addr);
    Ok(())
}
