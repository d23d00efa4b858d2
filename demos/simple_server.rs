//! Simple signaling server example
//!
//! Run with: cargo run --example simple_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_server                    # binds to 0.0.0.0:4000
//!   cargo run --example simple_server localhost          # binds to 127.0.0.1:4000
//!   cargo run --example simple_server 127.0.0.1:4001     # binds to 127.0.0.1:4001
//!
//! Talk to it with netcat, one JSON event per line:
//!
//!   nc localhost 4000
//!   {"event":"login","userId":"ana@example.com"}
//!   {"event":"createOrJoinGroupRoom","groupId":"g1","memberId":"ana@example.com"}
//!   {"event":"sendGroupMessage","groupId":"g1","message":"hi","senderIdentity":"ana@example.com"}

use std::net::SocketAddr;
use std::sync::Arc;

use sockhub::store::MemoryStore;
use sockhub::{ServerConfig, SocketServer};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:4000
/// - "localhost:4001" -> 127.0.0.1:4001
/// - "127.0.0.1" -> 127.0.0.1:4000
/// - "0.0.0.0:4000" -> 0.0.0.0:4000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 4000;

    // Replace "localhost" with "127.0.0.1"
    let normalized = arg.replace("localhost", "127.0.0.1");

    // Try parsing as SocketAddr first (includes port)
    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Try parsing as IP address without port
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: simple_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:4000)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  simple_server                     # binds to 0.0.0.0:4000");
    eprintln!("  simple_server localhost           # binds to 127.0.0.1:4000");
    eprintln!("  simple_server 127.0.0.1:4001      # binds to 127.0.0.1:4001");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:4000".parse().unwrap(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sockhub=debug".parse()?)
                .add_directive("simple_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig {
        bind_addr,
        ..ServerConfig::default()
    };

    println!("Starting socket server on {}", config.bind_addr);
    println!();
    println!("=== Try it ===");
    println!("nc localhost {}", config.bind_addr.port());
    println!("{{\"event\":\"login\",\"userId\":\"ana@example.com\"}}");
    println!();

    let store = Arc::new(MemoryStore::new());
    let server = SocketServer::new(config, store);

    server.run_until(async {
        let _ = tokio::signal::ctrl_c().await;
        println!("\nShutting down...");
    })
    .await?;

    Ok(())
}
