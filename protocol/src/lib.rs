use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod rules;

pub use rules::{is_stalemate, is_win, outcome_after, Outcome};

/// Opaque per-socket identity. A reconnect is a brand-new id.
pub type ConnectionId = Uuid;

/// Room names are handed out as `room-1`, `room-2`, ...
pub type RoomId = String;

/// ---- Marks ----
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// ---- Board ----
/// One square. On the wire an empty square is `""`, matching what browser
/// clients already send.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Mark::X),
            Cell::O => Some(Mark::O),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }
}

pub const BOARD_CELLS: usize = 9;

/// 3x3 grid, row-major, indices 0..=8.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Board([Cell; BOARD_CELLS]);

impl Board {
    pub fn new() -> Self {
        Board([Cell::Empty; BOARD_CELLS])
    }

    pub fn from_cells(cells: [Cell; BOARD_CELLS]) -> Self {
        Board(cells)
    }

    pub fn cells(&self) -> &[Cell; BOARD_CELLS] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        self.0.get(index).copied()
    }

    /// Overwrites whatever is at `index`. Legality is the caller's problem.
    pub fn set(&mut self, index: usize, cell: Cell) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = cell;
        }
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(|c| !c.is_empty())
    }

    pub fn is_clear(&self) -> bool {
        self.0.iter().all(|c| c.is_empty())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.0.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f, "---+---+---")?;
            }
            let line: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(col, c)| match c.mark() {
                    Some(m) => format!(" {} ", m),
                    None => format!(" {} ", row * 3 + col),
                })
                .collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}

/// ---- Messages ----
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientToServer {
    /// Proposed board after placing `mark`; `next` is who should move after.
    MakeMove {
        board: Board,
        room: RoomId,
        mark: Mark,
        next: Mark,
    },
    ResetGame {
        room: RoomId,
    },
    TauntOpponent {
        target: ConnectionId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ServerToClient {
    Hello {
        id: ConnectionId,
    },
    PlayerSign {
        mark: Mark,
    },
    ConnectToRoom {
        connection: ConnectionId,
        room: RoomId,
        members: Vec<ConnectionId>,
    },
    StartGame,
    UpdateBoard {
        board: Board,
        next: Mark,
    },
    GameWin {
        mark: Mark,
        board: Board,
    },
    Stalemate {
        board: Board,
    },
    ResetGame,
    UserLeft {
        connection: ConnectionId,
    },
    IncomingTaunt {
        message: String,
    },
    Error {
        message: String,
    },
}
