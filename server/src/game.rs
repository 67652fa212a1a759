use bridgebid_protocol::{Bid, Phase, RoomSnapshot, ServerToClient, ROOM_CAPACITY};
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::mpsc;
use uuid::Uuid;

pub type Rooms = HashMap<String, Room>;

/// A connection subscribed to a room's broadcasts. Not necessarily seated:
/// resyncing clients subscribe without joining.
pub struct Member {
    pub id: Uuid,
    pub tx: mpsc::UnboundedSender<ServerToClient>,
}

/// Per-round bidding state. Cloned and staged by the session handlers so an
/// action commits all of its mutations or none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BiddingState {
    pub highest_bid: Option<Bid>,
    pub bid_owner: Option<String>,
    pub passed: BTreeSet<String>,
    /// Seat index of the player whose action is awaited.
    pub current_turn: usize,
}

pub struct Room {
    pub code: String,
    /// Join order, which is also turn order.
    pub players: Vec<String>,
    pub phase: Phase,
    pub round: u32,
    /// Seat that opened the current round.
    pub opener: usize,
    pub bidding: BiddingState,
    pub members: Vec<Member>,
    pub opened_at: String,
}

impl Room {
    pub fn new(code: String) -> Self {
        Room {
            code,
            players: Vec::with_capacity(ROOM_CAPACITY),
            phase: Phase::Lobby,
            round: 0,
            opener: 0,
            bidding: BiddingState::default(),
            members: Vec::new(),
            opened_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= ROOM_CAPACITY
    }

    pub fn seat_of(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p == name)
    }

    pub fn current_player(&self) -> Option<&str> {
        self.players
            .get(self.bidding.current_turn)
            .map(String::as_str)
    }

    /// Fresh bidding state with `opener` to act first.
    pub fn start_round(&mut self, opener: usize) {
        self.phase = Phase::Bidding;
        self.round += 1;
        self.opener = opener;
        self.bidding = BiddingState {
            current_turn: opener,
            ..BiddingState::default()
        };
    }

    pub fn subscribe(&mut self, id: Uuid, tx: mpsc::UnboundedSender<ServerToClient>) {
        if !self.members.iter().any(|m| m.id == id) {
            self.members.push(Member { id, tx });
        }
    }

    pub fn unsubscribe(&mut self, id: Uuid) {
        self.members.retain(|m| m.id != id);
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            capacity: ROOM_CAPACITY,
            players: self.players.clone(),
            phase: self.phase,
            round: self.round,
            highest_bid: self.bidding.highest_bid,
            bid_owner: self.bidding.bid_owner.clone(),
            // seat order rather than set order
            passed_players: self
                .players
                .iter()
                .filter(|p| self.bidding.passed.contains(*p))
                .cloned()
                .collect(),
            current_turn: self.bidding.current_turn,
            current_player: self.current_player().map(str::to_string),
            opened_at: self.opened_at.clone(),
        }
    }
}

/// The room a join targets. Unknown codes fall back to `fallback` so the
/// join handler reports them as an invalid code rather than a missing room.
pub fn room_for<'a>(rooms: &'a mut Rooms, code: Option<&str>, fallback: &str) -> Option<&'a mut Room> {
    match code {
        Some(code) if rooms.contains_key(code) => rooms.get_mut(code),
        _ => rooms.get_mut(fallback),
    }
}
