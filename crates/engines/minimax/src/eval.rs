//! Material and piece-square evaluation.

use shakmaty::{Chess, Color, Position, Role};

/// Material values in centipawns.
fn material(role: Role) -> i32 {
    match role {
        Role::Pawn => 100,
        Role::Knight => 320,
        Role::Bishop => 330,
        Role::Rook => 500,
        Role::Queen => 900,
        Role::King => 0,
    }
}

// Piece-square bonuses for development, laid out from White's point of view
// with index 0 = a8 (top-left). Black reads the rotated index.

#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
     0,   5,   5, -10, -10,   5,   5,   0,
     0,  10,  -5,   0,   0,  -5,  10,   0,
     0,  10,  10,  20,  20,  10,  10,   0,
     5,  20,  20,  30,  30,  20,  20,   5,
     5,  15,  15,  25,  25,  15,  15,   5,
     0,  10,  10,  20,  20,  10,  10,   0,
     5,   5,  10, -20, -20,  10,   5,   5,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
   -50, -40, -30, -30, -30, -30, -40, -50,
   -40, -20,   0,   0,   0,   0, -20, -40,
   -30,   0,  10,  15,  15,  10,   0, -30,
   -30,   5,  15,  20,  20,  15,   5, -30,
   -30,   0,  15,  20,  20,  15,   0, -30,
   -30,   5,  10,  15,  15,  10,   5, -30,
   -40, -20,   0,   5,   5,   0, -20, -40,
   -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
   -20, -10, -10, -10, -10, -10, -10, -20,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -10,   0,   5,  10,  10,   5,   0, -10,
   -10,   5,   5,  10,  10,   5,   5, -10,
   -10,   0,  10,  10,  10,  10,   0, -10,
   -10,  10,  10,  10,  10,  10,  10, -10,
   -10,   5,   0,   0,   0,   0,   5, -10,
   -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
     0,   0,   0,   5,   5,   0,   0,   0,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
     5,  10,  10,  10,  10,  10,  10,   5,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
   -20, -10, -10,  -5,  -5, -10, -10, -20,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -10,   0,   5,   5,   5,   5,   0, -10,
    -5,   0,   5,   5,   5,   5,   0,  -5,
     0,   0,   5,   5,   5,   5,   0,  -5,
   -10,   5,   5,   5,   5,   5,   0, -10,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -20, -10, -10,  -5,  -5, -10, -10, -20,
];

const KING_PST: [i32; 64] = [0; 64];

fn table(role: Role) -> &'static [i32; 64] {
    match role {
        Role::Pawn => &PAWN_PST,
        Role::Knight => &KNIGHT_PST,
        Role::Bishop => &BISHOP_PST,
        Role::Rook => &ROOK_PST,
        Role::Queen => &QUEEN_PST,
        Role::King => &KING_PST,
    }
}

/// Evaluates the position in centipawns from the side to move's perspective.
///
/// Material plus piece-square bonuses are summed from White's point of view
/// and the total is negated when Black is to move.
pub fn evaluate(pos: &Chess) -> i32 {
    let mut score = 0i32;

    for (sq, piece) in pos.board().iter() {
        let file = sq.file() as usize;
        let rank = sq.rank() as usize;
        let idx = match piece.color {
            Color::White => (7 - rank) * 8 + file,
            Color::Black => rank * 8 + (7 - file),
        };
        let value = material(piece.role) + table(piece.role)[idx];
        match piece.color {
            Color::White => score += value,
            Color::Black => score -= value,
        }
    }

    if pos.turn() == Color::White {
        score
    } else {
        -score
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod eval_tests;
