use bridgebid_protocol::{Bid, ClientToServer, RoomSnapshot, ServerToClient, Suit};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "cli_client")]
#[command(about = "Interactive bridge bidding client")]
struct Args {
    /// Server websocket URL
    #[arg(long, default_value = "ws://127.0.0.1:9001/ws")]
    url: String,
    /// Display name (prompted if omitted)
    #[arg(long)]
    name: Option<String>,
    /// Lobby code (prompted if omitted)
    #[arg(long)]
    code: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🃏 Bridge Bidding CLI Client");
    println!("===========================");

    let player_name = match args.name {
        Some(name) => name,
        None => prompt("Enter your name: ")?,
    };
    let code = match args.code {
        Some(code) => code,
        None => prompt("Enter lobby code: ")?,
    };

    println!("🔗 Connecting to {}...", args.url);
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    println!("✅ Connected to server!");

    let (mut write, mut read) = ws_stream.split();

    let join_msg = ClientToServer::JoinLobby {
        name: Some(player_name.clone()),
        code: Some(code.clone()),
    };
    write.send(Message::Text(serde_json::to_string(&join_msg)?)).await?;
    println!("🚪 Joining lobby '{}'...", code);

    // Handle incoming messages
    tokio::spawn({
        let player_name = player_name.clone();
        async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Ok(server_msg) = serde_json::from_str::<ServerToClient>(&text) {
                            handle_server_message(server_msg, &player_name);
                        }
                    }
                    Ok(Message::Close(_)) => {
                        println!("🔌 Connection closed by server");
                        break;
                    }
                    Err(e) => {
                        println!("❌ WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    });

    println!("\n📋 Commands available:");
    println!("  bid <trick> <suit> - Bid, e.g. `bid 2 ♠`, `bid 3 nt`, `bid 1 clubs`");
    println!("  pass               - Pass for the rest of this round");
    println!("  state              - Fetch the current lobby state");
    println!("  round              - Start a new round after bidding ends");
    println!("  quit               - Exit");
    println!("\nType commands and press Enter:");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();

        if line == "quit" {
            break;
        }

        match parse_command(line, &player_name, &code) {
            Ok(msg) => {
                let json = serde_json::to_string(&msg)?;
                write.send(Message::Text(json)).await?;
            }
            Err(e) => println!("❓ {}", e),
        }
    }

    println!("👋 Goodbye!");
    Ok(())
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn parse_command(line: &str, player: &str, code: &str) -> Result<ClientToServer, String> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("bid") => {
            let trick = parts
                .next()
                .and_then(|t| t.parse::<u8>().ok())
                .ok_or("usage: bid <trick> <suit>")?;
            let suit_text = parts.collect::<Vec<_>>().join(" ");
            let suit: Suit = suit_text.parse().map_err(|e| format!("{e}"))?;
            let bid = Bid::new(trick, suit).map_err(|e| format!("{e}"))?;
            Ok(ClientToServer::PlaceBid {
                player: Some(player.to_string()),
                bid: Some(bid.into()),
            })
        }
        Some("pass") => Ok(ClientToServer::Pass {
            player: Some(player.to_string()),
        }),
        Some("state") => Ok(ClientToServer::SyncState {
            code: Some(code.to_string()),
        }),
        Some("round") => Ok(ClientToServer::NewRound {
            player: Some(player.to_string()),
        }),
        _ => Err(format!("Unknown command: {line}")),
    }
}

fn handle_server_message(msg: ServerToClient, player_name: &str) {
    match msg {
        ServerToClient::Hello { your_id } => {
            println!("👋 Welcome! Your ID: {}", your_id);
        }
        ServerToClient::UpdatePlayers { players } => {
            println!("👥 Players ({}/4): {}", players.len(), players.join(", "));
        }
        ServerToClient::StartGame { message } => {
            println!("🎬 {}", message);
        }
        ServerToClient::NewHighestBid { highest_bid, player } => {
            println!("📈 {} bids {}", player, highest_bid);
        }
        ServerToClient::NextTurn { player } => {
            if player == player_name {
                println!("👉 Your turn!");
            } else {
                println!("⏳ {}'s turn", player);
            }
        }
        ServerToClient::BiddingEnded { highest_bid, player } => match highest_bid {
            Some(bid) => println!("🏁 Bidding ended: {} wins the contract at {}", player, bid),
            None => println!("🏁 Bidding ended: passed out"),
        },
        ServerToClient::RoundStarted { round, player } => {
            println!("🔄 Round {} begins, {} opens", round, player);
        }
        ServerToClient::RoomState { lobby } => print_lobby(&lobby, player_name),
        ServerToClient::JoinError { error }
        | ServerToClient::BidError { error }
        | ServerToClient::PassError { error }
        | ServerToClient::RoundError { error }
        | ServerToClient::Error { error } => {
            println!("❌ Error: {}", error);
        }
    }
}

fn print_lobby(lobby: &RoomSnapshot, player_name: &str) {
    println!("\n🎲 === LOBBY {} ===", lobby.code);
    println!("🕹️  Phase: {:?} (round {})", lobby.phase, lobby.round);
    match (&lobby.highest_bid, &lobby.bid_owner) {
        (Some(bid), Some(owner)) => println!("📈 Highest bid: {} by {}", bid, owner),
        _ => println!("📈 No bids yet"),
    }
    for (i, player) in lobby.players.iter().enumerate() {
        let passed = if lobby.passed_players.contains(player) { " [PASSED]" } else { "" };
        let to_act = if lobby.current_player.as_deref() == Some(player.as_str()) {
            " 👈 TO ACT"
        } else {
            ""
        };
        let me = if player == player_name { " (you)" } else { "" };
        println!("  {}: {}{}{}{}", i, player, me, passed, to_act);
    }
    println!("==================\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bids() {
        let msg = parse_command("bid 2 ♠", "A", "ABCD").unwrap();
        assert_eq!(
            msg,
            ClientToServer::PlaceBid {
                player: Some("A".into()),
                bid: Some(Bid::new(2, Suit::Spades).unwrap().into()),
            }
        );
        let msg = parse_command("bid 3 no trump", "A", "ABCD").unwrap();
        assert!(matches!(msg, ClientToServer::PlaceBid { .. }));
    }

    #[test]
    fn rejects_bad_bids() {
        assert!(parse_command("bid", "A", "ABCD").is_err());
        assert!(parse_command("bid 9 ♠", "A", "ABCD").is_err());
        assert!(parse_command("bid 1 stars", "A", "ABCD").is_err());
        assert!(parse_command("fold", "A", "ABCD").is_err());
    }

    #[test]
    fn parses_other_commands() {
        assert_eq!(
            parse_command("pass", "B", "ABCD").unwrap(),
            ClientToServer::Pass {
                player: Some("B".into())
            }
        );
        assert_eq!(
            parse_command("state", "B", "ABCD").unwrap(),
            ClientToServer::SyncState {
                code: Some("ABCD".into())
            }
        );
    }
}
