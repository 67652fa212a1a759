use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Seats in a bridge room.
pub const ROOM_CAPACITY: usize = 4;
pub const MIN_TRICK: u8 = 1;
pub const MAX_TRICK: u8 = 7;

const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ROOM_CODE_LEN: usize = 4;

/// Generates a random four character room code (uppercase letters and digits).
pub fn generate_room_code() -> String {
    let mut rng = thread_rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_CHARSET[rng.gen_range(0..ROOM_CODE_CHARSET.len())] as char)
        .collect()
}

/// ---- Bid validation ----
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidBid {
    #[error("bid is missing its {0}")]
    MissingField(&'static str),
    #[error("unrecognized suit {0:?}")]
    UnknownSuit(String),
    #[error("trick count {0} is outside 1..=7")]
    TrickOutOfRange(i64),
    #[error("trick {0} is not a whole number")]
    NotATrickCount(String),
}

/// ---- Suits ----
///
/// Declaration order is bidding rank, lowest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String")]
pub enum Suit {
    #[serde(rename = "♣")]
    Clubs,
    #[serde(rename = "♦")]
    Diamonds,
    #[serde(rename = "♥")]
    Hearts,
    #[serde(rename = "♠")]
    Spades,
    #[serde(rename = "NT")]
    NoTrump,
}

impl Suit {
    pub const ALL: [Suit; 5] = [
        Suit::Clubs,
        Suit::Diamonds,
        Suit::Hearts,
        Suit::Spades,
        Suit::NoTrump,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Suit::Clubs => "♣",
            Suit::Diamonds => "♦",
            Suit::Hearts => "♥",
            Suit::Spades => "♠",
            Suit::NoTrump => "NT",
        }
    }

    /// The next suit up in bidding rank, if any.
    pub fn next(&self) -> Option<Suit> {
        match self {
            Suit::Clubs => Some(Suit::Diamonds),
            Suit::Diamonds => Some(Suit::Hearts),
            Suit::Hearts => Some(Suit::Spades),
            Suit::Spades => Some(Suit::NoTrump),
            Suit::NoTrump => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Suit {
    type Err = InvalidBid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let suit = match trimmed {
            "♣" => Suit::Clubs,
            "♦" => Suit::Diamonds,
            "♥" => Suit::Hearts,
            "♠" => Suit::Spades,
            _ => match trimmed.to_ascii_lowercase().as_str() {
                "clubs" | "club" | "c" => Suit::Clubs,
                "diamonds" | "diamond" | "d" => Suit::Diamonds,
                "hearts" | "heart" | "h" => Suit::Hearts,
                "spades" | "spade" | "s" => Suit::Spades,
                "nt" | "notrump" | "no trump" | "no_trump" => Suit::NoTrump,
                _ => return Err(InvalidBid::UnknownSuit(s.to_string())),
            },
        };
        Ok(suit)
    }
}

impl TryFrom<String> for Suit {
    type Error = InvalidBid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// ---- Bids ----
///
/// A contract proposal. Only constructible through validation, so every `Bid`
/// carries a recognized suit and a trick count in `MIN_TRICK..=MAX_TRICK`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "RawBid")]
pub struct Bid {
    suit: Suit,
    trick: u8,
}

impl Bid {
    pub fn new(trick: u8, suit: Suit) -> Result<Self, InvalidBid> {
        if !(MIN_TRICK..=MAX_TRICK).contains(&trick) {
            return Err(InvalidBid::TrickOutOfRange(trick as i64));
        }
        Ok(Bid { suit, trick })
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn trick(&self) -> u8 {
        self.trick
    }

    /// The lowest bid that beats `current`, or `None` above 7NT.
    pub fn next_above(current: Option<&Bid>) -> Option<Bid> {
        let Some(current) = current else {
            return Some(Bid {
                suit: Suit::Clubs,
                trick: MIN_TRICK,
            });
        };
        match current.suit.next() {
            Some(suit) => Some(Bid {
                suit,
                trick: current.trick,
            }),
            None if current.trick < MAX_TRICK => Some(Bid {
                suit: Suit::Clubs,
                trick: current.trick + 1,
            }),
            None => None,
        }
    }
}

impl Ord for Bid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.trick
            .cmp(&other.trick)
            .then_with(|| self.suit.cmp(&other.suit))
    }
}

impl PartialOrd for Bid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.trick, self.suit)
    }
}

/// Whether `candidate` strictly outranks `current`. Any bid beats no bid.
pub fn is_higher_bid(candidate: &Bid, current: Option<&Bid>) -> bool {
    current.map_or(true, |current| candidate > current)
}

/// A bid as it arrives off the wire, before validation. Decodes from any JSON
/// value so a badly typed bid still reaches the bid handler and is reported
/// as invalid bid data rather than an undecodable frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Value")]
pub struct RawBid {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suit: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trick: Option<Value>,
}

impl From<Value> for RawBid {
    fn from(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return RawBid::default();
        };
        let mut take = |key: &str| fields.remove(key).filter(|v| !v.is_null());
        RawBid {
            suit: take("suit"),
            trick: take("trick"),
        }
    }
}

impl TryFrom<RawBid> for Bid {
    type Error = InvalidBid;

    fn try_from(raw: RawBid) -> Result<Self, Self::Error> {
        let suit: Suit = match raw.suit.ok_or(InvalidBid::MissingField("suit"))? {
            Value::String(s) => s.parse()?,
            other => return Err(InvalidBid::UnknownSuit(other.to_string())),
        };
        let trick = raw.trick.ok_or(InvalidBid::MissingField("trick"))?;
        let trick = trick
            .as_i64()
            .ok_or_else(|| InvalidBid::NotATrickCount(trick.to_string()))?;
        let trick = u8::try_from(trick).map_err(|_| InvalidBid::TrickOutOfRange(trick))?;
        Bid::new(trick, suit)
    }
}

impl From<Bid> for RawBid {
    fn from(bid: Bid) -> Self {
        RawBid {
            suit: Some(bid.suit.symbol().into()),
            trick: Some(bid.trick.into()),
        }
    }
}

/// ---- Room state ----
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the table to fill.
    #[default]
    Lobby,
    Bidding,
    /// Bidding resolved; waiting for someone to open a new round.
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSnapshot {
    pub code: String,
    pub capacity: usize,
    pub players: Vec<String>,
    pub phase: Phase,
    pub round: u32,
    pub highest_bid: Option<Bid>,
    pub bid_owner: Option<String>,
    pub passed_players: Vec<String>,
    pub current_turn: usize,
    pub current_player: Option<String>,
    pub opened_at: String, // RFC 3339
}

/// Body of the HTTP lobby query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LobbyResponse {
    pub lobby: RoomSnapshot,
}

/// ---- Messages ----
///
/// Frames are `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientToServer {
    JoinLobby {
        name: Option<String>,
        code: Option<String>,
    },
    PlaceBid {
        player: Option<String>,
        bid: Option<RawBid>,
    },
    Pass {
        player: Option<String>,
    },
    // Resync after (re)connect
    SyncState {
        code: Option<String>,
    },
    NewRound {
        player: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerToClient {
    Hello {
        your_id: Uuid,
    },
    JoinError {
        error: String,
    },
    UpdatePlayers {
        players: Vec<String>,
    },
    StartGame {
        message: String,
    },
    BidError {
        error: String,
    },
    NewHighestBid {
        highest_bid: Bid,
        player: String,
    },
    PassError {
        error: String,
    },
    NextTurn {
        player: String,
    },
    BiddingEnded {
        highest_bid: Option<Bid>, // None when the round was passed out
        player: String,
    },
    RoomState {
        lobby: RoomSnapshot,
    },
    RoundStarted {
        round: u32,
        player: String,
    },
    RoundError {
        error: String,
    },
    Error {
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn all_bids() -> Vec<Bid> {
        (MIN_TRICK..=MAX_TRICK)
            .flat_map(|trick| Suit::ALL.iter().map(move |&suit| Bid::new(trick, suit).unwrap()))
            .collect()
    }

    fn bid(trick: u8, suit: Suit) -> Bid {
        Bid::new(trick, suit).unwrap()
    }

    #[test]
    fn suit_rank_runs_clubs_to_no_trump() {
        assert!(Suit::Clubs < Suit::Diamonds);
        assert!(Suit::Diamonds < Suit::Hearts);
        assert!(Suit::Hearts < Suit::Spades);
        assert!(Suit::Spades < Suit::NoTrump);
    }

    #[test]
    fn higher_trick_beats_any_suit() {
        assert!(is_higher_bid(&bid(2, Suit::Clubs), Some(&bid(1, Suit::NoTrump))));
        assert!(!is_higher_bid(&bid(1, Suit::NoTrump), Some(&bid(2, Suit::Clubs))));
    }

    #[test]
    fn same_trick_compares_suit() {
        assert!(is_higher_bid(&bid(1, Suit::Diamonds), Some(&bid(1, Suit::Clubs))));
        assert!(!is_higher_bid(&bid(1, Suit::Clubs), Some(&bid(1, Suit::Diamonds))));
    }

    #[test]
    fn equal_bid_is_not_higher() {
        let b = bid(3, Suit::Hearts);
        assert!(!is_higher_bid(&b, Some(&b)));
    }

    #[test]
    fn every_bid_beats_no_bid() {
        for b in all_bids() {
            assert!(is_higher_bid(&b, None), "{b} should open the bidding");
        }
    }

    #[test]
    fn comparison_is_antisymmetric_over_all_bids() {
        let bids = all_bids();
        assert_eq!(bids.len(), 35);
        for a in &bids {
            for b in &bids {
                if a == b {
                    assert!(!is_higher_bid(a, Some(b)));
                } else {
                    assert_ne!(is_higher_bid(a, Some(b)), is_higher_bid(b, Some(a)), "{a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn next_above_walks_the_whole_ladder() {
        let mut current = None;
        let mut seen = Vec::new();
        while let Some(next) = Bid::next_above(current.as_ref()) {
            if let Some(prev) = current {
                assert!(is_higher_bid(&next, Some(&prev)));
            }
            seen.push(next);
            current = Some(next);
        }
        assert_eq!(seen, all_bids());
        assert_eq!(current, Some(bid(7, Suit::NoTrump)));
    }

    #[test]
    fn suit_parses_symbols_and_names() {
        assert_eq!("♠".parse::<Suit>(), Ok(Suit::Spades));
        assert_eq!("NT".parse::<Suit>(), Ok(Suit::NoTrump));
        assert_eq!("No Trump".parse::<Suit>(), Ok(Suit::NoTrump));
        assert_eq!("diamonds".parse::<Suit>(), Ok(Suit::Diamonds));
        assert_eq!(
            "Stars".parse::<Suit>(),
            Err(InvalidBid::UnknownSuit("Stars".into()))
        );
    }

    #[test]
    fn raw_bid_validation() {
        let ok = RawBid {
            suit: Some("♥".into()),
            trick: Some(4.into()),
        };
        assert_eq!(Bid::try_from(ok), Ok(bid(4, Suit::Hearts)));

        let no_suit = RawBid {
            suit: None,
            trick: Some(1.into()),
        };
        assert_eq!(Bid::try_from(no_suit), Err(InvalidBid::MissingField("suit")));

        for trick in [0, 8, -1, 300] {
            let raw = RawBid {
                suit: Some("♣".into()),
                trick: Some(trick.into()),
            };
            assert_eq!(Bid::try_from(raw), Err(InvalidBid::TrickOutOfRange(trick)));
        }
    }

    #[test]
    fn badly_typed_bids_decode_then_fail_validation() {
        let cases = [
            (json!({"suit": "♠", "trick": "2"}), InvalidBid::NotATrickCount("\"2\"".into())),
            (json!({"suit": "♠", "trick": 1.5}), InvalidBid::NotATrickCount("1.5".into())),
            (json!({"suit": 5, "trick": 1}), InvalidBid::UnknownSuit("5".into())),
            (json!("1S"), InvalidBid::MissingField("suit")),
            (json!({"suit": null, "trick": 1}), InvalidBid::MissingField("suit")),
        ];
        for (value, expected) in cases {
            let raw: RawBid = serde_json::from_value(value).unwrap();
            assert_eq!(Bid::try_from(raw), Err(expected));
        }

        let msg: ClientToServer = serde_json::from_value(json!({
            "event": "place_bid",
            "data": {"player": "A", "bid": {"suit": "♠", "trick": "2"}}
        }))
        .unwrap();
        assert!(matches!(msg, ClientToServer::PlaceBid { bid: Some(_), .. }));
    }

    #[test]
    fn bid_wire_format_uses_suit_symbols() {
        let value = serde_json::to_value(bid(5, Suit::Spades)).unwrap();
        assert_eq!(value, json!({"suit": "♠", "trick": 5}));

        let parsed: Bid = serde_json::from_value(json!({"suit": "Clubs", "trick": 1})).unwrap();
        assert_eq!(parsed, bid(1, Suit::Clubs));

        assert!(serde_json::from_value::<Bid>(json!({"suit": "♠", "trick": 9})).is_err());
    }

    #[test]
    fn inbound_frames_tolerate_missing_fields() {
        let msg: ClientToServer =
            serde_json::from_value(json!({"event": "join_lobby", "data": {"name": "A"}})).unwrap();
        assert_eq!(
            msg,
            ClientToServer::JoinLobby {
                name: Some("A".into()),
                code: None
            }
        );

        let msg: ClientToServer = serde_json::from_value(json!({
            "event": "place_bid",
            "data": {"player": "B", "bid": {"suit": "♦"}}
        }))
        .unwrap();
        assert_eq!(
            msg,
            ClientToServer::PlaceBid {
                player: Some("B".into()),
                bid: Some(RawBid {
                    suit: Some("♦".into()),
                    trick: None
                }),
            }
        );
    }

    #[test]
    fn outbound_events_are_tagged() {
        let value = serde_json::to_value(ServerToClient::NextTurn { player: "C".into() }).unwrap();
        assert_eq!(value, json!({"event": "next_turn", "data": {"player": "C"}}));

        let value = serde_json::to_value(ServerToClient::BiddingEnded {
            highest_bid: None,
            player: "D".into(),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"event": "bidding_ended", "data": {"highest_bid": null, "player": "D"}})
        );
    }

    #[test]
    fn room_codes_are_four_uppercase_alphanumerics() {
        for _ in 0..32 {
            let code = generate_room_code();
            assert_eq!(code.len(), ROOM_CODE_LEN);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}
