//! Relay chat server library: roster, handshake, broadcast engine, client
//! session, listener, and stats reporter.

pub mod config;
pub mod connection;
pub mod error;
pub mod handshake;
pub mod roster;
pub mod server;
pub mod session;
pub mod stats;
