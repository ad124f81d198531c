//! Per-connection session state.

use std::net::SocketAddr;
use std::time::Instant;

/// A connected client. Gameplay state lives on the snake with the same id;
/// this record tracks only the connection itself.
#[derive(Debug)]
pub struct Client {
    pub id: u32,
    pub addr: SocketAddr,
    pub last_activity: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_activity: Instant::now(),
        }
    }

    /// Update activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}
