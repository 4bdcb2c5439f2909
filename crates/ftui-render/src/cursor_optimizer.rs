#![forbid(unsafe_code)]

//! Cursor-motion optimizer: picks the cheapest byte sequence to move the
//! cursor from one `(row, col)` to another.

/// Cursor positions of 1..=3 columns on the same row are cheaper to cover
/// with literal spaces than a relative cursor-forward escape.
pub const SPACE_THRESHOLD: u16 = 3;

/// A candidate cursor-motion encoding and its byte cost.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    bytes: Vec<u8>,
    cost: usize,
}

/// Move the cursor from `from` to `to` (both 1-indexed `(row, col)`),
/// returning the cheapest candidate's bytes and how many bytes were saved
/// versus always emitting an absolute `CSI row;col H` sequence.
#[must_use]
pub fn move_cursor(from: (u16, u16), to: (u16, u16)) -> (Vec<u8>, usize) {
    if from == to {
        return (Vec::new(), absolute_cost(to));
    }

    let mut candidates = vec![absolute(to)];

    if to == (0, 0) {
        candidates.push(home());
    }

    if from.0 == to.0 {
        let (row, from_col) = from;
        let to_col = to.1;
        if to_col > from_col {
            let dx = to_col - from_col;
            if dx > 0 && dx <= SPACE_THRESHOLD {
                candidates.push(literal_spaces(dx));
            }
            candidates.push(relative_horizontal(row, dx, true));
        } else if to_col < from_col {
            let dx = from_col - to_col;
            candidates.push(relative_horizontal(row, dx, false));
        }
    }

    if to.1 == 1 {
        candidates.push(carriage_return_then_vertical(from.0, to.0));
    } else {
        candidates.push(carriage_return_vertical_horizontal(from, to));
    }

    if to.0 != from.0 && to.1 == from.1 {
        candidates.push(vertical_only(from.0, to.0));
    }

    let best = candidates
        .into_iter()
        .min_by_key(|c| c.cost)
        .expect("absolute candidate is always present");

    let saved = absolute_cost(to).saturating_sub(best.cost);
    (best.bytes, saved)
}

fn absolute_cost(to: (u16, u16)) -> usize {
    4 + digits(to.0) + digits(to.1)
}

fn digits(mut n: u16) -> usize {
    n += 1; // 1-indexed on the wire
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

fn absolute(to: (u16, u16)) -> Candidate {
    let bytes = format!("\x1b[{};{}H", to.0 + 1, to.1 + 1).into_bytes();
    let cost = bytes.len();
    Candidate { bytes, cost }
}

fn home() -> Candidate {
    Candidate {
        bytes: b"\x1b[H".to_vec(),
        cost: 3,
    }
}

fn literal_spaces(n: u16) -> Candidate {
    let bytes = vec![b' '; n as usize];
    Candidate { cost: bytes.len(), bytes }
}

fn relative_horizontal(row: u16, n: u16, forward: bool) -> Candidate {
    let letter = if forward { 'C' } else { 'D' };
    let bytes = if n == 1 {
        format!("\x1b[{letter}").into_bytes()
    } else {
        format!("\x1b[{n}{letter}").into_bytes()
    };
    let cost = bytes.len();
    let _ = row;
    Candidate { bytes, cost }
}

fn vertical_sequence(from_row: u16, to_row: u16) -> Vec<u8> {
    if to_row == from_row {
        return Vec::new();
    }
    let (letter, n) = if to_row > from_row {
        ('B', to_row - from_row)
    } else {
        ('A', from_row - to_row)
    };
    if n == 1 {
        format!("\x1b[{letter}").into_bytes()
    } else {
        format!("\x1b[{n}{letter}").into_bytes()
    }
}

fn vertical_only(from_row: u16, to_row: u16) -> Candidate {
    let bytes = vertical_sequence(from_row, to_row);
    let cost = bytes.len();
    Candidate { bytes, cost }
}

fn carriage_return_then_vertical(from_row: u16, to_row: u16) -> Candidate {
    let mut bytes = vec![b'\r'];
    bytes.extend(vertical_sequence(from_row, to_row));
    let cost = bytes.len();
    Candidate { bytes, cost }
}

fn carriage_return_vertical_horizontal(from: (u16, u16), to: (u16, u16)) -> Candidate {
    let mut bytes = vec![b'\r'];
    bytes.extend(vertical_sequence(from.0, to.0));
    if to.1 > 0 {
        bytes.extend(relative_horizontal(to.0, to.1, true).bytes);
    }
    let cost = bytes.len();
    Candidate { bytes, cost }
}
