use std::fmt;

use tictactoe_protocol::{
    outcome_after, Board, Cell, ConnectionId, Mark, Outcome, RoomId, BOARD_CELLS,
};

use crate::error::IllegalMove;

pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// Fewer than two occupants. Nothing can be played.
    Unstarted,
    Active,
    Won(Mark),
    Stalemate,
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomPhase::Unstarted => write!(f, "waiting for an opponent"),
            RoomPhase::Active => write!(f, "active"),
            RoomPhase::Won(m) => write!(f, "won by {}", m),
            RoomPhase::Stalemate => write!(f, "in stalemate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub id: ConnectionId,
    pub mark: Mark,
}

/// One game instance: up to two occupants, the authoritative board, and whose turn it is.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    occupants: Vec<Occupant>,
    board: Board,
    turn: Mark,
    phase: RoomPhase,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Room {
            id,
            occupants: Vec::with_capacity(ROOM_CAPACITY),
            board: Board::new(),
            turn: Mark::X,
            phase: RoomPhase::Unstarted,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Mark {
        self.turn
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    pub fn members(&self) -> Vec<ConnectionId> {
        self.occupants.iter().map(|o| o.id).collect()
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() >= ROOM_CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub fn mark_of(&self, id: ConnectionId) -> Option<Mark> {
        self.occupants.iter().find(|o| o.id == id).map(|o| o.mark)
    }

    /// Seats a connection and returns its mark: X unless X is already taken.
    /// Filling the second seat starts the game. Callers must not seat into a
    /// full room.
    pub(crate) fn seat(&mut self, id: ConnectionId) -> Mark {
        let mark = if self.occupants.iter().any(|o| o.mark == Mark::X) {
            Mark::O
        } else {
            Mark::X
        };
        self.occupants.push(Occupant { id, mark });
        if self.is_full() {
            self.board = Board::new();
            self.turn = Mark::X;
            self.phase = RoomPhase::Active;
        }
        mark
    }

    /// Removes a connection. Any game in progress stops; the board is kept
    /// until the next reset. Returns false if `id` was not seated here.
    pub(crate) fn vacate(&mut self, id: ConnectionId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|o| o.id != id);
        if self.occupants.len() == before {
            return false;
        }
        self.phase = RoomPhase::Unstarted;
        true
    }

    /// Places `mover` on `index` after checking phase, turn, and occupancy.
    pub fn play(&mut self, mover: Mark, index: usize) -> Result<Outcome, IllegalMove> {
        self.check_turn(mover)?;
        match self.board.get(index) {
            None => return Err(IllegalMove::OutOfRange(index)),
            Some(cell) if !cell.is_empty() => return Err(IllegalMove::CellOccupied(index)),
            Some(_) => {}
        }

        self.board.set(index, mover.into());
        let outcome = outcome_after(&self.board, mover);
        match outcome {
            Outcome::Win(m) => self.phase = RoomPhase::Won(m),
            Outcome::Stalemate => self.phase = RoomPhase::Stalemate,
            Outcome::Continue { next } => self.turn = next,
        }
        Ok(outcome)
    }

    /// Accepts a client's proposed full board if it is exactly the current
    /// board plus one new `mover` mark on an empty cell.
    pub fn apply_submitted(
        &mut self,
        mover: Mark,
        submitted: &Board,
    ) -> Result<Outcome, IllegalMove> {
        self.check_turn(mover)?;

        let changed: Vec<usize> = (0..BOARD_CELLS)
            .filter(|&i| self.board.get(i) != submitted.get(i))
            .collect();
        let index = match changed.as_slice() {
            [] => return Err(IllegalMove::NoChange),
            [i] => *i,
            many => return Err(IllegalMove::TooManyChanges(many.len())),
        };

        if self.board.get(index) != Some(Cell::Empty) {
            return Err(IllegalMove::CellOccupied(index));
        }
        if submitted.get(index) != Some(Cell::from(mover)) {
            return Err(IllegalMove::WrongMarkPlaced {
                index,
                expected: mover,
            });
        }
        self.play(mover, index)
    }

    /// Clears the board and hands the turn back to X. Only a full room goes
    /// back to active.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.turn = Mark::X;
        self.phase = if self.is_full() {
            RoomPhase::Active
        } else {
            RoomPhase::Unstarted
        };
    }

    pub(crate) fn check_turn(&self, mover: Mark) -> Result<(), IllegalMove> {
        if self.phase != RoomPhase::Active {
            return Err(IllegalMove::GameNotActive(self.phase));
        }
        if mover != self.turn {
            return Err(IllegalMove::NotYourTurn { expected: self.turn });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn full_room() -> (Room, ConnectionId, ConnectionId) {
        let mut r = Room::new("room-1".into());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(r.seat(a), Mark::X);
        assert_eq!(r.phase(), RoomPhase::Unstarted);
        assert_eq!(r.seat(b), Mark::O);
        (r, a, b)
    }

    #[test]
    fn second_seat_starts_the_game() {
        let (r, a, b) = full_room();
        assert_eq!(r.phase(), RoomPhase::Active);
        assert_eq!(r.turn(), Mark::X);
        assert_eq!(r.members(), vec![a, b]);
        assert_eq!(r.mark_of(b), Some(Mark::O));
    }

    #[test]
    fn turns_alternate() {
        let (mut r, _, _) = full_room();
        assert_eq!(r.play(Mark::X, 4), Ok(Outcome::Continue { next: Mark::O }));
        assert_eq!(r.turn(), Mark::O);
        assert_eq!(
            r.play(Mark::X, 0),
            Err(IllegalMove::NotYourTurn { expected: Mark::O })
        );
        assert_eq!(r.play(Mark::O, 0), Ok(Outcome::Continue { next: Mark::X }));
    }

    #[test]
    fn occupied_cell_is_refused_without_mutation() {
        let (mut r, _, _) = full_room();
        r.play(Mark::X, 4).unwrap();
        let before = *r.board();
        assert_eq!(r.play(Mark::O, 4), Err(IllegalMove::CellOccupied(4)));
        assert_eq!(*r.board(), before);
        assert_eq!(r.turn(), Mark::O);
    }

    #[test]
    fn out_of_range_cell() {
        let (mut r, _, _) = full_room();
        assert_eq!(r.play(Mark::X, 9), Err(IllegalMove::OutOfRange(9)));
    }

    #[test]
    fn unstarted_room_refuses_moves() {
        let mut r = Room::new("room-1".into());
        r.seat(Uuid::new_v4());
        assert_eq!(
            r.play(Mark::X, 0),
            Err(IllegalMove::GameNotActive(RoomPhase::Unstarted))
        );
    }

    #[test]
    fn win_ends_the_game_until_reset() {
        let (mut r, _, _) = full_room();
        for (mark, idx) in [(Mark::X, 0), (Mark::O, 3), (Mark::X, 1), (Mark::O, 4)] {
            r.play(mark, idx).unwrap();
        }
        assert_eq!(r.play(Mark::X, 2), Ok(Outcome::Win(Mark::X)));
        assert_eq!(r.phase(), RoomPhase::Won(Mark::X));
        assert!(matches!(
            r.play(Mark::O, 5),
            Err(IllegalMove::GameNotActive(RoomPhase::Won(Mark::X)))
        ));

        r.reset();
        assert!(r.board().is_clear());
        assert_eq!(r.turn(), Mark::X);
        assert_eq!(r.phase(), RoomPhase::Active);
    }

    #[test]
    fn stalemate_is_terminal() {
        let (mut r, _, _) = full_room();
        // Ends as X O X / X O O / O X X.
        let moves = [
            (Mark::X, 0),
            (Mark::O, 1),
            (Mark::X, 2),
            (Mark::O, 4),
            (Mark::X, 3),
            (Mark::O, 5),
            (Mark::X, 7),
            (Mark::O, 6),
        ];
        for (mark, idx) in moves {
            assert!(matches!(r.play(mark, idx), Ok(Outcome::Continue { .. })));
        }
        assert_eq!(r.play(Mark::X, 8), Ok(Outcome::Stalemate));
        assert_eq!(r.phase(), RoomPhase::Stalemate);
    }

    #[test]
    fn submitted_board_must_add_exactly_one_mark() {
        let (mut r, _, _) = full_room();

        let unchanged = *r.board();
        assert_eq!(r.apply_submitted(Mark::X, &unchanged), Err(IllegalMove::NoChange));

        let mut two = Board::new();
        two.set(0, Cell::X);
        two.set(1, Cell::X);
        assert_eq!(r.apply_submitted(Mark::X, &two), Err(IllegalMove::TooManyChanges(2)));

        let mut wrong = Board::new();
        wrong.set(0, Cell::O);
        assert_eq!(
            r.apply_submitted(Mark::X, &wrong),
            Err(IllegalMove::WrongMarkPlaced { index: 0, expected: Mark::X })
        );

        let mut good = Board::new();
        good.set(0, Cell::X);
        assert_eq!(
            r.apply_submitted(Mark::X, &good),
            Ok(Outcome::Continue { next: Mark::O })
        );
        assert_eq!(*r.board(), good);
    }

    #[test]
    fn submitted_board_cannot_overwrite() {
        let (mut r, _, _) = full_room();
        r.play(Mark::X, 0).unwrap();
        let mut overwrite = *r.board();
        overwrite.set(0, Cell::O);
        assert_eq!(r.apply_submitted(Mark::O, &overwrite), Err(IllegalMove::CellOccupied(0)));
        assert_eq!(r.board().get(0), Some(Cell::X));
    }

    #[test]
    fn leaving_stops_the_game_and_reset_stays_unstarted() {
        let (mut r, a, b) = full_room();
        r.play(Mark::X, 4).unwrap();
        assert!(r.vacate(a));
        assert!(!r.vacate(a));
        assert_eq!(r.phase(), RoomPhase::Unstarted);
        assert_eq!(r.members(), vec![b]);

        r.reset();
        assert!(r.board().is_clear());
        assert_eq!(r.phase(), RoomPhase::Unstarted);
    }
}
