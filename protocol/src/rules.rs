//! Win and stalemate evaluation. Pure functions of the board contents.

use crate::{Board, Cell, Mark};

/// The eight index triples that win: rows, columns, diagonals.
pub const WIN_LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// What a board means for the player who just moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win(Mark),
    Stalemate,
    Continue { next: Mark },
}

/// True if any line is entirely `mark`.
pub fn is_win(board: &Board, mark: Mark) -> bool {
    let want = Cell::from(mark);
    let cells = board.cells();
    WIN_LINES
        .iter()
        .any(|line| line.iter().all(|&i| cells[i] == want))
}

/// Full board and nobody owns a line. A full board with a line is a win.
pub fn is_stalemate(board: &Board) -> bool {
    board.is_full() && !is_win(board, Mark::X) && !is_win(board, Mark::O)
}

/// Win is checked for the mover first, then stalemate.
pub fn outcome_after(board: &Board, mover: Mark) -> Outcome {
    if is_win(board, mover) {
        Outcome::Win(mover)
    } else if is_stalemate(board) {
        Outcome::Stalemate
    } else {
        Outcome::Continue {
            next: mover.opponent(),
        }
    }
}
