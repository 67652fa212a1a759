//! Turn rotation for a bidding round.

use bridgebid_protocol::{Bid, ServerToClient};

use crate::error::TurnError;
use crate::game::BiddingState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    NextPlayer(String),
    BiddingEnded {
        highest_bid: Option<Bid>,
        player: String,
    },
}

impl TurnOutcome {
    pub fn to_event(&self) -> ServerToClient {
        match self {
            TurnOutcome::NextPlayer(player) => ServerToClient::NextTurn {
                player: player.clone(),
            },
            TurnOutcome::BiddingEnded {
                highest_bid,
                player,
            } => ServerToClient::BiddingEnded {
                highest_bid: *highest_bid,
                player: player.clone(),
            },
        }
    }
}

/// Moves the turn pointer to the next player who has not passed, or ends the
/// round once a single active player remains.
///
/// The winner is the owner of the highest bid; in a passed-out round (no
/// bids at all) it is the one player who never passed.
pub fn advance(players: &[String], bidding: &mut BiddingState) -> Result<TurnOutcome, TurnError> {
    if players.is_empty() {
        return Err(TurnError::NoPlayers);
    }

    let mut active = players.iter().filter(|p| !bidding.passed.contains(*p));
    let first_active = active.next().ok_or(TurnError::NoActivePlayers)?;
    if active.next().is_none() {
        let player = bidding
            .bid_owner
            .clone()
            .unwrap_or_else(|| first_active.clone());
        return Ok(TurnOutcome::BiddingEnded {
            highest_bid: bidding.highest_bid,
            player,
        });
    }

    let n = players.len();
    for _ in 0..n {
        bidding.current_turn = (bidding.current_turn + 1) % n;
        let candidate = &players[bidding.current_turn];
        if !bidding.passed.contains(candidate) {
            return Ok(TurnOutcome::NextPlayer(candidate.clone()));
        }
    }
    // at least two players are active, so the loop always finds one
    Err(TurnError::NoActivePlayers)
}
