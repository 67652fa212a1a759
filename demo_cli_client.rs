use bridgebid_protocol::{Bid, ClientToServer, ServerToClient};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "demo_cli")]
#[command(about = "Scripted bridge bidding bot")]
struct Args {
    /// Display name
    name: Option<String>,
    #[arg(long, default_value = "ws://127.0.0.1:9001/ws")]
    url: String,
    #[arg(long, default_value = "ABCD")]
    code: String,
    /// Highest trick level this bot will bid before passing
    #[arg(long, default_value = "3")]
    ceiling: u8,
    /// Rounds to play before idling
    #[arg(long, default_value = "1")]
    rounds: u32,
}

/// What the bot knows about the table.
#[derive(Debug, Default)]
struct Table {
    players: Vec<String>,
    highest: Option<Bid>,
    rounds_done: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let player_name = args
        .name
        .clone()
        .unwrap_or_else(|| format!("Player{}", std::process::id()));

    println!("🤖 Bridge bidding bot: {} (ceiling {})", player_name, args.ceiling);
    println!("🔗 Connecting to {}...", args.url);

    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    println!("✅ [{}] Connected to server!", player_name);

    let (mut write, mut read) = ws_stream.split();

    let join_msg = ClientToServer::JoinLobby {
        name: Some(player_name.clone()),
        code: Some(args.code.clone()),
    };
    write.send(Message::Text(serde_json::to_string(&join_msg)?)).await?;

    let mut table = Table::default();

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let Ok(server_msg) = serde_json::from_str::<ServerToClient>(&text) else {
                    continue;
                };
                log_event(&server_msg, &player_name);

                if let Some(response) = respond(&mut table, &server_msg, &player_name, &args) {
                    tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
                    let response_json = serde_json::to_string(&response)?;
                    write.send(Message::Text(response_json)).await?;
                }
            }
            Ok(Message::Close(_)) => {
                println!("🔌 [{}] Connection closed by server", player_name);
                break;
            }
            Err(e) => {
                println!("❌ [{}] WebSocket error: {}", player_name, e);
                break;
            }
            _ => {}
        }
    }

    println!("👋 {} disconnected!", player_name);
    Ok(())
}

/// Updates the bot's view of the table and picks its next action, if any.
fn respond(table: &mut Table, msg: &ServerToClient, me: &str, args: &Args) -> Option<ClientToServer> {
    match msg {
        ServerToClient::UpdatePlayers { players } => {
            table.players = players.clone();
            None
        }
        // the first seat opens without a next_turn
        ServerToClient::StartGame { .. } => {
            (table.players.first().map(String::as_str) == Some(me)).then(|| act(table, me, args.ceiling))
        }
        ServerToClient::NewHighestBid { highest_bid, .. } => {
            table.highest = Some(*highest_bid);
            None
        }
        ServerToClient::NextTurn { player } if player == me => Some(act(table, me, args.ceiling)),
        ServerToClient::RoundStarted { .. } => {
            table.highest = None;
            None
        }
        ServerToClient::BiddingEnded { player, .. } => {
            table.rounds_done += 1;
            (player == me && table.rounds_done < args.rounds).then(|| ClientToServer::NewRound {
                player: Some(me.to_string()),
            })
        }
        _ => None,
    }
}

fn act(table: &Table, me: &str, ceiling: u8) -> ClientToServer {
    match Bid::next_above(table.highest.as_ref()) {
        Some(bid) if bid.trick() <= ceiling => ClientToServer::PlaceBid {
            player: Some(me.to_string()),
            bid: Some(bid.into()),
        },
        _ => ClientToServer::Pass {
            player: Some(me.to_string()),
        },
    }
}

fn log_event(msg: &ServerToClient, me: &str) {
    match msg {
        ServerToClient::UpdatePlayers { players } => println!("👥 [{}] Players: {}", me, players.join(", ")),
        ServerToClient::StartGame { message } => println!("🎬 [{}] {}", me, message),
        ServerToClient::NewHighestBid { highest_bid, player } => {
            println!("📈 [{}] {} bids {}", me, player, highest_bid)
        }
        ServerToClient::NextTurn { player } => println!("⏳ [{}] {}'s turn", me, player),
        ServerToClient::BiddingEnded { highest_bid: Some(bid), player } => {
            println!("🏁 [{}] {} wins the contract at {}", me, player, bid)
        }
        ServerToClient::BiddingEnded { highest_bid: None, .. } => println!("🏁 [{}] Passed out", me),
        ServerToClient::RoundStarted { round, player } => {
            println!("🔄 [{}] Round {} begins, {} opens", me, round, player)
        }
        ServerToClient::JoinError { error }
        | ServerToClient::BidError { error }
        | ServerToClient::PassError { error }
        | ServerToClient::RoundError { error }
        | ServerToClient::Error { error } => println!("❌ [{}] Error: {}", me, error),
        _ => {}
    }
}
