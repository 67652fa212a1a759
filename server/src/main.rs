use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use bridgebid_protocol::*;
use clap::Parser;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod error;
mod game;
mod session;
mod turn;

use config::ServerConfig;
use error::JoinError;
use game::{Room, Rooms};

#[derive(Clone)]
struct AppState {
    inner: Arc<Mutex<Rooms>>,
    /// Code of the lobby created at startup. Actions from connections that
    /// never joined go here.
    default_room: String,
}

impl AppState {
    fn with_room(code: String) -> Self {
        let mut rooms = HashMap::new();
        rooms.insert(code.clone(), Room::new(code.clone()));
        AppState {
            inner: Arc::new(Mutex::new(rooms)),
            default_room: code,
        }
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/lobby", get(default_lobby_handler))
        .route("/lobby/:code", get(lobby_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    let code = config.resolve_room_code()?;
    let state = AppState::with_room(code.clone());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(room_code = %code, "server listening on ws://{addr}/ws");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    info!("shutdown requested");
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn default_lobby_handler(State(state): State<AppState>) -> impl IntoResponse {
    lobby_snapshot(&state, &state.default_room)
}

async fn lobby_handler(Path(code): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    lobby_snapshot(&state, &code)
}

fn lobby_snapshot(state: &AppState, code: &str) -> Result<Json<LobbyResponse>, StatusCode> {
    let rooms = state.inner.lock();
    rooms
        .get(code)
        .map(|r| Json(LobbyResponse { lobby: r.snapshot() }))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (tx_out, mut rx_out) = mpsc::unbounded_channel::<ServerToClient>();

    tokio::spawn(async move {
        while let Some(msg) = rx_out.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "failed to encode event");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let my_id = Uuid::new_v4();
    debug!(conn = %short_id(my_id), "connection opened");
    let _ = tx_out.send(ServerToClient::Hello { your_id: my_id });

    let mut joined_room: Option<String> = None;

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(t) => match serde_json::from_str::<ClientToServer>(&t) {
                Ok(cmd) => route_cmd(cmd, &state, &mut joined_room, my_id, &tx_out),
                Err(e) => {
                    debug!(conn = %short_id(my_id), error = %e, "undecodable frame");
                    let _ = tx_out.send(ServerToClient::Error {
                        error: "bad json".into(),
                    });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // The seat stays; only the subscription goes.
    if let Some(room) = &joined_room {
        with_room(&state, room, |r| r.unsubscribe(my_id));
    }
    debug!(conn = %short_id(my_id), "connection closed");
}

/// Single dispatcher for inbound actions. Every arm holds the rooms lock
/// across validate, mutate and broadcast so members see events in the order
/// they were applied.
fn route_cmd(
    cmd: ClientToServer,
    state: &AppState,
    joined_room: &mut Option<String>,
    my_id: Uuid,
    tx_out: &mpsc::UnboundedSender<ServerToClient>,
) {
    debug!(conn = %short_id(my_id), ?cmd, "inbound");

    match cmd {
        ClientToServer::JoinLobby { name, code } => {
            let mut rooms = state.inner.lock();
            let Some(r) = game::room_for(&mut rooms, code.as_deref(), &state.default_room) else {
                let _ = tx_out.send(ServerToClient::JoinError {
                    error: JoinError::InvalidCode.to_string(),
                });
                return;
            };
            match session::join(r, name.as_deref(), code.as_deref()) {
                Ok(events) => {
                    r.subscribe(my_id, tx_out.clone());
                    broadcast(r, &events);
                    let _ = tx_out.send(ServerToClient::RoomState { lobby: r.snapshot() });
                    let code = r.code.clone();
                    switch_room(&mut rooms, joined_room, code, my_id);
                }
                Err(e) => {
                    debug!(conn = %short_id(my_id), error = %e, "join rejected");
                    let _ = tx_out.send(ServerToClient::JoinError { error: e.to_string() });
                }
            }
        }
        ClientToServer::SyncState { code } => {
            let mut rooms = state.inner.lock();
            let found = match code.as_deref() {
                Some(c) => rooms.get_mut(c),
                None => None,
            };
            match found {
                Some(r) => {
                    r.subscribe(my_id, tx_out.clone());
                    let _ = tx_out.send(ServerToClient::RoomState { lobby: r.snapshot() });
                    let code = r.code.clone();
                    switch_room(&mut rooms, joined_room, code, my_id);
                }
                None => {
                    let _ = tx_out.send(ServerToClient::JoinError {
                        error: JoinError::InvalidCode.to_string(),
                    });
                }
            }
        }
        ClientToServer::PlaceBid { player, bid } => {
            let room = joined_room.as_deref().unwrap_or(&state.default_room);
            with_room(state, room, |r| match session::place_bid(r, player.as_deref(), bid) {
                Ok(events) => broadcast(r, &events),
                Err(e) => {
                    if e.is_precondition() {
                        error!(room = %r.code, error = %e, "bid aborted");
                    } else {
                        debug!(room = %r.code, error = %e, "bid rejected");
                    }
                    let _ = tx_out.send(ServerToClient::BidError { error: e.to_string() });
                }
            });
        }
        ClientToServer::Pass { player } => {
            let room = joined_room.as_deref().unwrap_or(&state.default_room);
            with_room(state, room, |r| match session::pass(r, player.as_deref()) {
                Ok(events) => broadcast(r, &events),
                Err(e) => {
                    if e.is_precondition() {
                        error!(room = %r.code, error = %e, "pass aborted");
                    } else {
                        debug!(room = %r.code, error = %e, "pass rejected");
                    }
                    let _ = tx_out.send(ServerToClient::PassError { error: e.to_string() });
                }
            });
        }
        ClientToServer::NewRound { player } => {
            let room = joined_room.as_deref().unwrap_or(&state.default_room);
            with_room(state, room, |r| match session::new_round(r, player.as_deref()) {
                Ok(events) => broadcast(r, &events),
                Err(e) => {
                    debug!(room = %r.code, error = %e, "new round rejected");
                    let _ = tx_out.send(ServerToClient::RoundError { error: e.to_string() });
                }
            });
        }
    }
}

fn with_room<R>(state: &AppState, room: &str, f: impl FnOnce(&mut Room) -> R) -> Option<R> {
    let mut rooms = state.inner.lock();
    match rooms.get_mut(room) {
        Some(r) => Some(f(r)),
        None => {
            warn!(room, "action for unknown room");
            None
        }
    }
}

/// Records `code` as the connection's room, dropping its subscription to any
/// previous one.
fn switch_room(rooms: &mut Rooms, joined_room: &mut Option<String>, code: String, my_id: Uuid) {
    if let Some(previous) = joined_room.as_deref() {
        if previous != code {
            if let Some(r) = rooms.get_mut(previous) {
                r.unsubscribe(my_id);
            }
        }
    }
    *joined_room = Some(code);
}

/* ---------------- broadcast ---------------- */

fn broadcast(r: &Room, events: &[ServerToClient]) {
    for event in events {
        for m in r.members.iter() {
            if m.tx.send(event.clone()).is_err() {
                warn!(room = %r.code, conn = %short_id(m.id), "failed to deliver event");
            }
        }
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}
