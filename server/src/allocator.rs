use std::collections::HashMap;

use tictactoe_protocol::{ConnectionId, Mark, RoomId};

use crate::room::Room;

/// Where a connection was placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub room: RoomId,
    pub mark: Mark,
}

/// Pairs connections two at a time. All joins go to the room under the
/// cursor; once it holds two occupants the cursor moves to a room number
/// that has never been used.
#[derive(Debug)]
pub struct RoomAllocator {
    rooms: HashMap<RoomId, Room>,
    cursor: u64,
}

impl Default for RoomAllocator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn room_name(n: u64) -> RoomId {
    format!("room-{n}")
}

impl RoomAllocator {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            cursor: 1,
        }
    }

    /// Room that the next connection will join.
    pub fn current_room(&self) -> RoomId {
        room_name(self.cursor)
    }

    pub fn assign(&mut self, id: ConnectionId) -> Seat {
        let room_id = self.current_room();
        let room = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(room_id.clone()));
        let mark = room.seat(id);
        if room.is_full() {
            self.cursor += 1;
        }
        Seat {
            room: room_id,
            mark,
        }
    }

    /// Takes `id` out of `room_id`. Returns the room if anyone is left in it;
    /// an emptied room is dropped.
    pub fn release(&mut self, id: ConnectionId, room_id: &RoomId) -> Option<&Room> {
        let room = self.rooms.get_mut(room_id)?;
        room.vacate(id);
        if room.is_empty() {
            self.rooms.remove(room_id);
            return None;
        }
        self.rooms.get(room_id)
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
