//! Lobby actions. Each handler validates against the room, commits its
//! mutations, and returns the events to broadcast to the room's members.
//! On error the room is unchanged.

use bridgebid_protocol::{is_higher_bid, Bid, Phase, RawBid, ServerToClient, ROOM_CAPACITY};
use tracing::{debug, info};

use crate::error::{BidError, JoinError, PassError, RoundError};
use crate::game::Room;
use crate::turn::{self, TurnOutcome};

pub const START_GAME_MESSAGE: &str = "All players connected! Starting game...";

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Seats `name` in `room`. Filling the last seat opens the first bidding
/// round and emits `start_game`.
pub fn join(
    room: &mut Room,
    name: Option<&str>,
    code: Option<&str>,
) -> Result<Vec<ServerToClient>, JoinError> {
    let (Some(name), Some(code)) = (non_empty(name), non_empty(code)) else {
        return Err(JoinError::MissingField);
    };
    if code != room.code {
        return Err(JoinError::InvalidCode);
    }
    if room.is_full() {
        return Err(JoinError::RoomFull);
    }
    if room.seat_of(name).is_some() {
        return Err(JoinError::NameTaken);
    }

    room.players.push(name.to_string());
    info!(room = %room.code, player = name, seats = room.players.len(), "player joined");

    let mut events = vec![ServerToClient::UpdatePlayers {
        players: room.players.clone(),
    }];
    if room.players.len() == ROOM_CAPACITY {
        room.start_round(0);
        info!(room = %room.code, round = room.round, "table full, bidding opens");
        events.push(ServerToClient::StartGame {
            message: START_GAME_MESSAGE.to_string(),
        });
    }
    Ok(events)
}

pub fn place_bid(
    room: &mut Room,
    player: Option<&str>,
    bid: Option<RawBid>,
) -> Result<Vec<ServerToClient>, BidError> {
    let player = non_empty(player).ok_or(BidError::InvalidBid)?;
    let bid = bid
        .ok_or(BidError::InvalidBid)
        .and_then(|raw| {
            Bid::try_from(raw).map_err(|e| {
                debug!(error = %e, "rejected malformed bid");
                BidError::InvalidBid
            })
        })?;
    if room.phase != Phase::Bidding {
        return Err(BidError::NotBidding);
    }
    if room.current_player() != Some(player) {
        return Err(BidError::NotYourTurn);
    }
    if !is_higher_bid(&bid, room.bidding.highest_bid.as_ref()) {
        return Err(BidError::BidTooLow);
    }

    let mut staged = room.bidding.clone();
    staged.highest_bid = Some(bid);
    staged.bid_owner = Some(player.to_string());
    // a bidder is active again even if recorded as passed
    staged.passed.remove(player);
    let outcome = turn::advance(&room.players, &mut staged)?;
    room.bidding = staged;
    info!(room = %room.code, player, %bid, "new highest bid");

    let mut events = vec![ServerToClient::NewHighestBid {
        highest_bid: bid,
        player: player.to_string(),
    }];
    events.push(apply_outcome(room, outcome));
    Ok(events)
}

pub fn pass(room: &mut Room, player: Option<&str>) -> Result<Vec<ServerToClient>, PassError> {
    if room.phase != Phase::Bidding {
        return Err(PassError::NotBidding);
    }
    let player = non_empty(player).ok_or(PassError::NotYourTurn)?;
    if room.current_player() != Some(player) {
        return Err(PassError::NotYourTurn);
    }

    let mut staged = room.bidding.clone();
    staged.passed.insert(player.to_string());
    let outcome = turn::advance(&room.players, &mut staged)?;
    room.bidding = staged;
    info!(room = %room.code, player, passed = room.bidding.passed.len(), "player passed");

    Ok(vec![apply_outcome(room, outcome)])
}

/// Opens the next round once bidding has ended. The opening seat moves one to
/// the left each round.
pub fn new_round(room: &mut Room, player: Option<&str>) -> Result<Vec<ServerToClient>, RoundError> {
    if room.phase != Phase::Ended {
        return Err(RoundError::NotEnded);
    }
    // a seated requester means the table is not empty
    if non_empty(player).and_then(|p| room.seat_of(p)).is_none() {
        return Err(RoundError::NotSeated);
    }

    let opener = (room.opener + 1) % room.players.len();
    room.start_round(opener);
    let first = room.players[opener].clone();
    info!(room = %room.code, round = room.round, opener = %first, "new bidding round");

    Ok(vec![
        ServerToClient::RoundStarted {
            round: room.round,
            player: first.clone(),
        },
        ServerToClient::NextTurn { player: first },
    ])
}

fn apply_outcome(room: &mut Room, outcome: TurnOutcome) -> ServerToClient {
    if let TurnOutcome::BiddingEnded { highest_bid, player } = &outcome {
        room.phase = Phase::Ended;
        match highest_bid {
            Some(bid) => info!(room = %room.code, winner = %player, %bid, "bidding ended"),
            None => info!(room = %room.code, last_active = %player, "round passed out"),
        }
    }
    outcome.to_event()
}
