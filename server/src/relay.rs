use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tictactoe_protocol::{
    Board, ClientToServer, ConnectionId, Mark, Outcome, RoomId, ServerToClient,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::allocator::{RoomAllocator, Seat};
use crate::error::{IllegalMove, RelayError};
use crate::room::Room;
use crate::taunts;

/// Outbound queue for one socket. The socket task drains it.
pub type Outbox = mpsc::UnboundedSender<ServerToClient>;

struct Connection {
    seat: Seat,
    tx: Outbox,
}

#[derive(Default)]
struct RelayState {
    rooms: RoomAllocator,
    connections: HashMap<ConnectionId, Connection>,
}

/// Shared handle to every room and connection. Each event runs to
/// completion under one lock, so joins and moves never interleave.
#[derive(Clone, Default)]
pub struct Relay {
    inner: Arc<Mutex<RelayState>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats a new connection, tells it who it is, announces it to the room,
    /// and starts the game if it filled the room.
    pub fn connect(&self, id: ConnectionId, tx: Outbox) -> Seat {
        let mut guard = self.inner.lock();
        let RelayState { rooms, connections } = &mut *guard;

        let seat = rooms.assign(id);
        connections.insert(
            id,
            Connection {
                seat: seat.clone(),
                tx: tx.clone(),
            },
        );
        let _ = tx.send(ServerToClient::Hello { id });
        let _ = tx.send(ServerToClient::PlayerSign { mark: seat.mark });

        if let Some(room) = rooms.room(&seat.room) {
            info!(connection = %short(id), room = %seat.room, mark = %seat.mark, "joined");
            broadcast(
                connections,
                room,
                ServerToClient::ConnectToRoom {
                    connection: id,
                    room: seat.room.clone(),
                    members: room.members(),
                },
            );
            if room.is_full() {
                info!(room = %seat.room, "game started");
                broadcast(connections, room, ServerToClient::StartGame);
            }
        }
        seat
    }

    pub fn dispatch(&self, from: ConnectionId, cmd: ClientToServer) -> Result<(), RelayError> {
        match cmd {
            ClientToServer::MakeMove {
                board,
                room,
                mark,
                next,
            } => self.make_move(from, &board, &room, mark, next),
            ClientToServer::ResetGame { room } => self.reset(from, &room),
            ClientToServer::TauntOpponent { target } => self.taunt(from, target),
        }
    }

    /// Validates a proposed board against the room's authoritative one and
    /// broadcasts exactly one of `updateBoard`, `gameWin`, or `stalemate`.
    pub fn make_move(
        &self,
        from: ConnectionId,
        board: &Board,
        room_id: &RoomId,
        mark: Mark,
        next: Mark,
    ) -> Result<(), RelayError> {
        let mut guard = self.inner.lock();
        let RelayState { rooms, connections } = &mut *guard;

        let seat = seat_of(connections, from)?;
        let room = seated_room(rooms, seat, room_id)?;
        if mark != seat.mark {
            return Err(IllegalMove::NotYourMark {
                assigned: seat.mark,
                claimed: mark,
            }
            .into());
        }
        room.check_turn(mark)?;
        if next != mark.opponent() {
            return Err(IllegalMove::WrongNextMark {
                expected: mark.opponent(),
            }
            .into());
        }

        let outcome = room.apply_submitted(mark, board)?;
        let board = *room.board();
        let msg = match outcome {
            Outcome::Win(winner) => {
                info!(room = %room_id, winner = %winner, "game won");
                ServerToClient::GameWin {
                    mark: winner,
                    board,
                }
            }
            Outcome::Stalemate => {
                info!(room = %room_id, "stalemate");
                ServerToClient::Stalemate { board }
            }
            Outcome::Continue { next } => {
                debug!(room = %room_id, mover = %mark, next = %next, "move accepted");
                ServerToClient::UpdateBoard { board, next }
            }
        };
        broadcast(connections, room, msg);
        Ok(())
    }

    pub fn reset(&self, from: ConnectionId, room_id: &RoomId) -> Result<(), RelayError> {
        let mut guard = self.inner.lock();
        let RelayState { rooms, connections } = &mut *guard;

        let seat = seat_of(connections, from)?;
        let room = seated_room(rooms, seat, room_id)?;
        room.reset();
        info!(connection = %short(from), room = %room_id, phase = %room.phase(), "game reset");
        broadcast(connections, room, ServerToClient::ResetGame);
        Ok(())
    }

    /// Sends one random taunt to `target` only.
    pub fn taunt(&self, from: ConnectionId, target: ConnectionId) -> Result<(), RelayError> {
        let guard = self.inner.lock();
        seat_of(&guard.connections, from)?;
        let to = guard
            .connections
            .get(&target)
            .ok_or(RelayError::UnknownConnection(target))?;

        let message = taunts::random_taunt();
        info!(from = %short(from), to = %short(target), taunt = message, "taunt");
        send(
            target,
            &to.tx,
            ServerToClient::IncomingTaunt {
                message: message.to_string(),
            },
        );
        Ok(())
    }

    /// Forgets the connection and tells whoever is left in its room.
    pub fn disconnect(&self, id: ConnectionId) {
        let mut guard = self.inner.lock();
        let RelayState { rooms, connections } = &mut *guard;

        let Some(conn) = connections.remove(&id) else {
            return;
        };
        info!(connection = %short(id), room = %conn.seat.room, "left");
        match rooms.release(id, &conn.seat.room) {
            Some(room) => broadcast(connections, room, ServerToClient::UserLeft { connection: id }),
            None => debug!(room = %conn.seat.room, "room emptied and dropped"),
        }
    }

    pub fn room_count(&self) -> usize {
        self.inner.lock().rooms.room_count()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.lock().connections.len()
    }

    /// Copy of a room's current state.
    pub fn room(&self, room_id: &RoomId) -> Option<Room> {
        self.inner.lock().rooms.room(room_id).cloned()
    }
}

fn seat_of(
    connections: &HashMap<ConnectionId, Connection>,
    id: ConnectionId,
) -> Result<&Seat, RelayError> {
    connections
        .get(&id)
        .map(|c| &c.seat)
        .ok_or(RelayError::UnknownConnection(id))
}

fn seated_room<'a>(
    rooms: &'a mut RoomAllocator,
    seat: &Seat,
    room_id: &RoomId,
) -> Result<&'a mut Room, RelayError> {
    let room = rooms
        .room_mut(room_id)
        .ok_or_else(|| RelayError::UnknownRoom(room_id.clone()))?;
    if seat.room != *room_id {
        return Err(RelayError::NotInRoom(room_id.clone()));
    }
    Ok(room)
}

fn broadcast(connections: &HashMap<ConnectionId, Connection>, room: &Room, msg: ServerToClient) {
    for occupant in room.occupants() {
        match connections.get(&occupant.id) {
            Some(conn) => send(occupant.id, &conn.tx, msg.clone()),
            None => debug!(
                connection = %short(occupant.id),
                room = %room.id(),
                "occupant has no connection"
            ),
        }
    }
}

fn send(id: ConnectionId, tx: &Outbox, msg: ServerToClient) {
    if tx.send(msg).is_err() {
        debug!(connection = %short(id), "send failed, socket already closed");
    }
}

pub(crate) fn short(id: ConnectionId) -> String {
    id.to_string()[..8].to_string()
}
