//! Websocket gateway.
//!
//! Accepts connections, enforces connection limits, and pumps each socket
//! in its own task: inbound text frames go to `GameState::handle_message`
//! under the write lock, outbound events arrive over broadcast channels
//! and are serialized outside any lock.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use protocol::Event;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::config::Config;

pub mod client;
pub mod game;

pub use game::{run_game_loop, GameState, PendingBroadcasts, SessionPhase};

/// An event addressed to a single connection.
#[derive(Debug, Clone)]
pub struct TargetedEvent {
    pub client_id: u32,
    pub event: Event,
}

/// Connection tracking shared across connection handlers.
struct ConnectionState {
    ip_connections: HashMap<IpAddr, usize>,
    total_connections: usize,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            ip_connections: HashMap::new(),
            total_connections: 0,
        }
    }

    fn try_add_connection(&mut self, ip: IpAddr, max_total: usize, max_per_ip: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }
        let count = self.ip_connections.entry(ip).or_insert(0);
        if *count >= max_per_ip {
            return false;
        }
        *count += 1;
        self.total_connections += 1;
        true
    }

    fn remove_connection(&mut self, ip: IpAddr) {
        if let Some(count) = self.ip_connections.get_mut(&ip) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.ip_connections.remove(&ip);
            }
        }
        self.total_connections = self.total_connections.saturating_sub(1);
    }
}

/// Run the server: bind, spawn the game loop, accept connections forever.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("{} listening on ws://{}", config.server.name, addr);

    let conn_state = Arc::new(RwLock::new(ConnectionState::new()));
    let (events_tx, _events_rx) = broadcast::channel::<Event>(64);
    let (targeted_tx, _targeted_rx) = broadcast::channel::<TargetedEvent>(64);

    let game_state = Arc::new(RwLock::new(GameState::new(
        &config,
        events_tx.clone(),
        targeted_tx.clone(),
    )));

    let game_loop_state = Arc::clone(&game_state);
    let tick_interval = config.server.tick_interval_ms;
    tokio::spawn(async move {
        game::run_game_loop(game_loop_state, tick_interval).await;
    });

    let max_connections = config.server.max_connections;
    let ip_limit = config.server.ip_limit;

    loop {
        let (stream, peer) = listener.accept().await?;
        let ip = peer.ip();
        {
            let mut state = conn_state.write().await;
            if !state.try_add_connection(ip, max_connections, ip_limit) {
                warn!("Connection rejected (limit reached): {}", peer);
                continue;
            }
        }

        let game_state = Arc::clone(&game_state);
        let conn_state = Arc::clone(&conn_state);
        let events_rx = events_tx.subscribe();
        let targeted_rx = targeted_tx.subscribe();
        tokio::spawn(async move {
            let result = handle_connection(stream, peer, game_state, events_rx, targeted_rx).await;
            {
                let mut state = conn_state.write().await;
                state.remove_connection(ip);
            }
            if let Err(e) = result {
                error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    game_state: Arc<RwLock<GameState>>,
    mut events_rx: broadcast::Receiver<Event>,
    mut targeted_rx: broadcast::Receiver<TargetedEvent>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    let client_id = {
        let mut state = game_state.write().await;
        state.add_client(peer)
    };

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let mut state = game_state.write().await;
                        state.handle_message(client_id, &text);
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", peer);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", peer, e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
            event = events_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !send_event(&mut write, &event, peer).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!("Client {} lagged, dropped {} events", peer, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            targeted = targeted_rx.recv() => {
                match targeted {
                    Ok(message) if message.client_id == client_id => {
                        if !send_event(&mut write, &message.event, peer).await {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!("Client {} lagged, dropped {} targeted events", peer, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    {
        let mut state = game_state.write().await;
        state.remove_client(client_id);
    }
    Ok(())
}

/// Serialize and send one event. Returns false when the connection is gone.
async fn send_event(
    write: &mut SplitSink<WebSocketStream<TcpStream>, Message>,
    event: &Event,
    peer: SocketAddr,
) -> bool {
    let text = match event.encode() {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to encode event: {}", e);
            return true;
        }
    };
    if let Err(e) = write.send(Message::Text(text.into())).await {
        warn!("Failed to send to {}: {}", peer, e);
        return false;
    }
    true
}
