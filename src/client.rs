use std::sync::Arc;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tictactoe_protocol::{Board, ClientToServer, ConnectionId, Mark, RoomId, ServerToClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

pub const DEFAULT_URL: &str = "ws://127.0.0.1:4001/ws";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Unstarted,
    Started,
    Win,
    Lose,
    Stalemate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Move(usize),
    Reset,
    Taunt,
}

/// What this terminal knows about its game, rebuilt from server messages.
#[derive(Debug)]
struct View {
    id: Option<ConnectionId>,
    mark: Option<Mark>,
    room: Option<RoomId>,
    members: Vec<ConnectionId>,
    board: Board,
    turn: Mark,
    status: Status,
}

impl Default for View {
    fn default() -> Self {
        View {
            id: None,
            mark: None,
            room: None,
            members: vec![],
            board: Board::new(),
            turn: Mark::X,
            status: Status::Unstarted,
        }
    }
}

impl View {
    /// Folds one server message into the view. Returns a line worth printing.
    fn apply(&mut self, msg: &ServerToClient) -> Option<String> {
        match msg {
            ServerToClient::Hello { id } => {
                self.id = Some(*id);
                None
            }
            ServerToClient::PlayerSign { mark } => {
                self.mark = Some(*mark);
                Some(format!("You are {mark}"))
            }
            ServerToClient::ConnectToRoom {
                connection,
                room,
                members,
            } => {
                self.room = Some(room.clone());
                self.members = members.clone();
                if Some(*connection) == self.id {
                    Some(format!("Playing in {room}"))
                } else {
                    Some("An opponent joined".to_string())
                }
            }
            ServerToClient::StartGame => {
                self.clear(Status::Started);
                Some("Game started".to_string())
            }
            ServerToClient::UpdateBoard { board, next } => {
                self.board = *board;
                self.turn = *next;
                None
            }
            ServerToClient::GameWin { mark, board } => {
                self.board = *board;
                self.status = if Some(*mark) == self.mark {
                    Status::Win
                } else {
                    Status::Lose
                };
                None
            }
            ServerToClient::Stalemate { board } => {
                self.board = *board;
                self.status = Status::Stalemate;
                None
            }
            ServerToClient::ResetGame => {
                let status = if self.members.len() > 1 {
                    Status::Started
                } else {
                    Status::Unstarted
                };
                self.clear(status);
                Some("The game has been reset!".to_string())
            }
            ServerToClient::UserLeft { connection } => {
                self.members.retain(|m| m != connection);
                self.clear(Status::Unstarted);
                Some("Your opponent left the game..".to_string())
            }
            ServerToClient::IncomingTaunt { message } => Some(format!("Opponent says: {message}")),
            ServerToClient::Error { message } => Some(format!("Server refused: {message}")),
        }
    }

    fn clear(&mut self, status: Status) {
        self.board = Board::new();
        self.turn = Mark::X;
        self.status = status;
    }

    fn opponent(&self) -> Option<ConnectionId> {
        self.members.iter().copied().find(|m| Some(*m) != self.id)
    }

    fn status_line(&self) -> &'static str {
        match self.status {
            Status::Unstarted => "Waiting for opponent to connect..",
            Status::Stalemate => "It's a stalemate!",
            Status::Win => "You win!",
            Status::Lose => "You lose..",
            Status::Started if Some(self.turn) == self.mark => "It's your turn",
            Status::Started => "Opponent's turn",
        }
    }

    /// Turns a command into a message, refusing the ones the server would
    /// refuse anyway.
    fn plan(&self, cmd: Command) -> Result<ClientToServer, &'static str> {
        let (Some(mark), Some(room)) = (self.mark, self.room.clone()) else {
            return Err("Not seated yet");
        };
        match cmd {
            Command::Move(index) => {
                match self.status {
                    Status::Unstarted => return Err("The game hasn't started yet!"),
                    Status::Win | Status::Lose | Status::Stalemate => {
                        return Err("The game is over!")
                    }
                    Status::Started => {}
                }
                if self.turn != mark {
                    return Err("It's not your turn!");
                }
                match self.board.get(index) {
                    None => return Err("Pick a square from 0 to 8"),
                    Some(cell) if !cell.is_empty() => return Err("This spot is taken!"),
                    Some(_) => {}
                }
                let mut board = self.board;
                board.set(index, mark.into());
                Ok(ClientToServer::MakeMove {
                    board,
                    room,
                    mark,
                    next: mark.opponent(),
                })
            }
            Command::Reset => {
                if self.status == Status::Unstarted {
                    return Err("Your opponent is not here!");
                }
                Ok(ClientToServer::ResetGame { room })
            }
            Command::Taunt => match self.opponent() {
                Some(target) => Ok(ClientToServer::TauntOpponent { target }),
                None => Err("Who are you taunting?"),
            },
        }
    }
}

pub async fn run(url: &str) -> anyhow::Result<()> {
    println!("Tic-tac-toe terminal client");
    println!("Connecting to {}...", url);

    let (ws_stream, _) = connect_async(url)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    println!("Connected to server!");

    let (mut write, mut read) = ws_stream.split();
    let view = Arc::new(Mutex::new(View::default()));

    let reader = tokio::spawn({
        let view = view.clone();
        async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerToClient>(&text) {
                        Ok(server_msg) => {
                            debug!(?server_msg, "received");
                            let mut view = view.lock();
                            if let Some(note) = view.apply(&server_msg) {
                                println!("{note}");
                            }
                            print_view(&view);
                        }
                        Err(err) => warn!(%err, "unreadable server message"),
                    },
                    Ok(Message::Close(_)) => {
                        println!("Connection closed by server");
                        break;
                    }
                    Err(e) => {
                        println!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    });

    println!("\nCommands available:");
    println!("  move <0-8>  - Place your mark");
    println!("  reset       - Start the game over");
    println!("  taunt       - Annoy your opponent");
    println!("  quit        - Exit the game");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "quit" {
            break;
        }
        let Some(cmd) = parse_command(line) else {
            if !line.is_empty() {
                println!("Unknown command: {}", line);
            }
            continue;
        };

        let planned = view.lock().plan(cmd);
        match planned {
            Ok(msg) => {
                let json = serde_json::to_string(&msg)?;
                write.send(Message::Text(json)).await?;
            }
            Err(reason) => println!("{reason}"),
        }
    }

    let _ = write.close().await;
    reader.abort();
    println!("Goodbye!");
    Ok(())
}

fn print_view(view: &View) {
    println!();
    print!("{}", view.board);
    let room = view.room.as_deref().unwrap_or("-");
    let mark = view.mark.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string());
    println!("[{room}] you are {mark}: {}", view.status_line());
}

fn parse_command(input: &str) -> Option<Command> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    match parts.as_slice() {
        [cmd, index] if cmd.eq_ignore_ascii_case("move") => index.parse().ok().map(Command::Move),
        [cmd] if cmd.eq_ignore_ascii_case("reset") => Some(Command::Reset),
        [cmd] if cmd.eq_ignore_ascii_case("taunt") => Some(Command::Taunt),
        _ => None,
    }
}
