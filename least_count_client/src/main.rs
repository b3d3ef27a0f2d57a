use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use pico_args::Arguments;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use least_count_core::{Card, ClientMessage, PlayerAction, PlayerView, RoundOutcome, ServerMessage};

const DEFAULT_SERVER: &str = "ws://127.0.0.1:5555/ws";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut pargs = Arguments::from_env();
    let server: String = pargs.opt_value_from_str("--server")?.unwrap_or_else(|| DEFAULT_SERVER.to_string());
    let name: String = pargs.opt_value_from_str("--name")?.unwrap_or_default();

    let mut url = Url::parse(&server).with_context(|| format!("invalid server url {server}"))?;
    url.query_pairs_mut().append_pair("name", &name);

    println!("Connecting to {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await.context("could not connect")?;
    println!("Connected!");

    let (mut write, mut read) = ws_stream.split();

    // Print whatever the server pushes while the main task reads commands.
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(server_msg) => {
                        print_server_message(&server_msg);
                        print!("> ");
                        let _ = std::io::stdout().flush();
                    }
                    Err(e) => eprintln!("Failed to parse server message: {}", e),
                },
                Ok(Message::Close(_)) => {
                    println!("\nServer closed the connection.");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error while receiving: {}", e);
                    break;
                }
            }
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- Least Count ---");
    println!("Commands:");
    println!("  discard <rank> of <suit>  - throw every card of that value, e.g. discard 7 of Clubs");
    println!("  draw                      - draw from the deck");
    println!("  pickup                    - take the top of the discard pile");
    println!("  skip                      - skip drawing, if you threw the discard pile's number");
    println!("  show                      - end the round, lowest total wins");
    println!("  new                       - deal a new round");
    println!("  exit                      - quit");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else { break };
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        let action = match command {
            "" => continue,
            "discard" => match rest.parse::<Card>() {
                Ok(card) => PlayerAction::Discard(card),
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
            "draw" => PlayerAction::Draw,
            "pickup" => PlayerAction::DrawFromDiscard,
            "skip" => PlayerAction::SameNumberSkip,
            "show" => PlayerAction::Show,
            "new" => PlayerAction::NewGame,
            "exit" => {
                println!("Disconnecting...");
                break;
            }
            _ => {
                println!("Unknown command: {}", line);
                continue;
            }
        };

        let payload = serde_json::to_string(&ClientMessage::from(action))?;
        write.send(Message::Text(payload.into())).await?;
    }

    let _ = write.close().await;
    Ok(())
}

fn print_server_message(msg: &ServerMessage) {
    match msg {
        ServerMessage::Welcome { your_id } => println!("\nSeated as {}", your_id),
        ServerMessage::GameStateSnapshot(view) => print_view(view),
        ServerMessage::Error { message } => println!("\n[!] {}", message),
    }
}

fn print_view(view: &PlayerView) {
    println!();
    if !view.game_started {
        println!("Waiting for players ({:?}), {} seated", view.phase, view.player_summaries.len());
        return;
    }
    for id in &view.turn_order {
        let Some(summary) = view.player_summaries.get(id) else { continue };
        let marker = if view.current_turn_player_id == Some(*id) { "*" } else { " " };
        let me = if *id == view.your_id { " (you)" } else { "" };
        println!(" {} {}{}: {} cards", marker, summary.nickname, me, summary.hand_size);
    }
    println!("Deck: {} cards", view.deck_size);
    match &view.discard_top {
        Some(card) => println!("Discard pile: {}", card),
        None => println!("Discard pile: empty"),
    }
    if let Some(pending) = &view.pending_discard {
        let cards: Vec<_> = pending.cards.iter().map(Card::to_string).collect();
        println!("Just thrown: {}", cards.join(", "));
    }
    let hand: Vec<_> = view.own_hand.iter().map(Card::to_string).collect();
    let total: u32 = view.own_hand.iter().map(Card::value).sum();
    println!("Your hand ({}): {}", total, hand.join(", "));
    match view.round_result {
        Some(RoundOutcome::Winner) => println!("Round over: you win!"),
        Some(RoundOutcome::Loser) => println!("Round over: you lose."),
        None => {}
    }
}
