//! Error types for lobby actions.
//!
//! Every user-facing variant is a local rejection of one action: the room is
//! left untouched and only the requester hears about it. The `Display` text
//! is what goes out in the `*_error` events.

use thiserror::Error;

/// Rejections of `join_lobby`, in validation order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Name and lobby code are required.")]
    MissingField,
    #[error("Invalid lobby code.")]
    InvalidCode,
    #[error("Lobby is full.")]
    RoomFull,
    #[error("Name already taken.")]
    NameTaken,
}

/// Rejections of `place_bid`, in validation order. Bidding is gated by the
/// room's phase: bids are only accepted once the table is full and until the
/// round ends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidError {
    #[error("Invalid bid data.")]
    InvalidBid,
    #[error("Bidding is not open.")]
    NotBidding,
    #[error("It's not your turn.")]
    NotYourTurn,
    #[error("Your bid must be higher than the current highest bid.")]
    BidTooLow,
    #[error(transparent)]
    Precondition(#[from] TurnError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    #[error("Bidding is not open.")]
    NotBidding,
    #[error("It's not your turn.")]
    NotYourTurn,
    #[error(transparent)]
    Precondition(#[from] TurnError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("The current bidding round is still open.")]
    NotEnded,
    #[error("Only seated players can start a new round.")]
    NotSeated,
}

/// Setup bugs in turn rotation. Never caused by a well-formed client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("cannot advance the turn in a room with no players")]
    NoPlayers,
    #[error("cannot advance the turn: every player has passed")]
    NoActivePlayers,
}

impl BidError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, BidError::Precondition(_))
    }
}

impl PassError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, PassError::Precondition(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid room code {code:?}: {reason}")]
    InvalidRoomCode { code: String, reason: &'static str },
}
