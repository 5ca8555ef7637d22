use thiserror::Error;
use tictactoe_protocol::{ConnectionId, Mark, RoomId};

use crate::room::RoomPhase;

/// Why a proposed move was refused. The board is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("game is not active (room is {0})")]
    GameNotActive(RoomPhase),
    #[error("it is {expected}'s turn")]
    NotYourTurn { expected: Mark },
    #[error("you play {assigned}, not {claimed}")]
    NotYourMark { assigned: Mark, claimed: Mark },
    #[error("next mark must be {expected}")]
    WrongNextMark { expected: Mark },
    #[error("cell {0} does not exist")]
    OutOfRange(usize),
    #[error("cell {0} is already taken")]
    CellOccupied(usize),
    #[error("board has no new mark on it")]
    NoChange,
    #[error("board changes {0} cells, expected exactly one")]
    TooManyChanges(usize),
    #[error("cell {index} holds the wrong mark, expected {expected}")]
    WrongMarkPlaced { index: usize, expected: Mark },
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMove),
    #[error("unknown room {0}")]
    UnknownRoom(RoomId),
    #[error("you are not seated in {0}")]
    NotInRoom(RoomId),
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
}
