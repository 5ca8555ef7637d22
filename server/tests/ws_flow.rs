use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tictactoe_protocol::{Board, Cell, ClientToServer, ConnectionId, Mark, ServerToClient};
use tictactoe_server::Relay;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(tictactoe_server::serve(listener, Relay::new()));
    format!("ws://{addr}/ws")
}

async fn next_msg(ws: &mut Ws) -> ServerToClient {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for server")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send(ws: &mut Ws, cmd: &ClientToServer) {
    let text = serde_json::to_string(cmd).unwrap();
    ws.send(Message::Text(text)).await.unwrap();
}

/// Connects X then O and reads every message of the pairing handshake.
async fn paired(url: &str) -> (Ws, ConnectionId, Ws, ConnectionId) {
    let (mut x, _) = connect_async(url).await.unwrap();
    let x_id = match next_msg(&mut x).await {
        ServerToClient::Hello { id } => id,
        other => panic!("expected hello, got {:?}", other),
    };
    assert_eq!(next_msg(&mut x).await, ServerToClient::PlayerSign { mark: Mark::X });
    assert!(matches!(next_msg(&mut x).await, ServerToClient::ConnectToRoom { .. }));

    let (mut o, _) = connect_async(url).await.unwrap();
    let o_id = match next_msg(&mut o).await {
        ServerToClient::Hello { id } => id,
        other => panic!("expected hello, got {:?}", other),
    };
    assert_eq!(next_msg(&mut o).await, ServerToClient::PlayerSign { mark: Mark::O });
    let joined = ServerToClient::ConnectToRoom {
        connection: o_id,
        room: "room-1".into(),
        members: vec![x_id, o_id],
    };
    assert_eq!(next_msg(&mut o).await, joined);
    assert_eq!(next_msg(&mut o).await, ServerToClient::StartGame);
    assert_eq!(next_msg(&mut x).await, joined);
    assert_eq!(next_msg(&mut x).await, ServerToClient::StartGame);

    (x, x_id, o, o_id)
}

#[tokio::test]
async fn two_players_pair_move_and_leave() {
    let url = start_server().await;
    let (mut x, x_id, mut o, o_id) = paired(&url).await;

    // O tries to jump the queue and only O hears about it.
    let mut board = Board::new();
    board.set(4, Cell::O);
    send(
        &mut o,
        &ClientToServer::MakeMove {
            board,
            room: "room-1".into(),
            mark: Mark::O,
            next: Mark::X,
        },
    )
    .await;
    assert!(matches!(next_msg(&mut o).await, ServerToClient::Error { .. }));

    let mut board = Board::new();
    board.set(4, Cell::X);
    send(
        &mut x,
        &ClientToServer::MakeMove {
            board,
            room: "room-1".into(),
            mark: Mark::X,
            next: Mark::O,
        },
    )
    .await;
    let update = ServerToClient::UpdateBoard { board, next: Mark::O };
    assert_eq!(next_msg(&mut x).await, update);
    assert_eq!(next_msg(&mut o).await, update);

    send(&mut x, &ClientToServer::TauntOpponent { target: o_id }).await;
    assert!(matches!(next_msg(&mut o).await, ServerToClient::IncomingTaunt { .. }));

    x.close(None).await.unwrap();
    assert_eq!(next_msg(&mut o).await, ServerToClient::UserLeft { connection: x_id });
}

#[tokio::test]
async fn dropped_socket_without_close_frame_notifies_opponent() {
    let url = start_server().await;
    let (x, x_id, mut o, _) = paired(&url).await;

    // No close handshake: the TCP stream just goes away.
    drop(x);
    assert_eq!(next_msg(&mut o).await, ServerToClient::UserLeft { connection: x_id });

    // The survivor is back to waiting, so a move is refused.
    let mut board = Board::new();
    board.set(0, Cell::O);
    send(
        &mut o,
        &ClientToServer::MakeMove {
            board,
            room: "room-1".into(),
            mark: Mark::O,
            next: Mark::X,
        },
    )
    .await;
    assert!(matches!(next_msg(&mut o).await, ServerToClient::Error { .. }));
}

#[tokio::test]
async fn garbage_frames_get_an_error() {
    let url = start_server().await;
    let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
    for _ in 0..3 {
        next_msg(&mut ws).await;
    }

    ws.send(Message::Text("{\"makeMove\": 7}".into())).await.unwrap();
    match next_msg(&mut ws).await {
        ServerToClient::Error { message } => assert!(message.starts_with("bad json")),
        other => panic!("expected error, got {:?}", other),
    }
}
