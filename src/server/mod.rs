//! TCP server: accept loop, connection I/O, and event dispatch

pub mod config;
pub mod connection;
pub mod gateway;
pub mod listener;

pub use config::ServerConfig;
pub use listener::SocketServer;
