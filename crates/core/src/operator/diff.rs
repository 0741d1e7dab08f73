//! Shared helper for CONSEQ/ENDSEQ's incremental maintenance: given an
//! identifier's previous full accumulated sequence and its current one,
//! recover how many leading positions expired and which positions are
//! newly appended at the tail. `SeqOp` only ever drops from the front
//! (expiry) and appends at the back, so this never needs to search the
//! middle of either sequence.

use alloc::vec::Vec;

use crate::sequence::{Position, Sequence};

pub(crate) fn leading_drop_and_tail(prev: Option<&Sequence>, cur: &Sequence) -> (usize, Vec<Position>) {
    let Some(prev) = prev else {
        let tail = (0..cur.len()).filter_map(|i| cur.position_slot(i).cloned()).collect();
        return (0, tail);
    };
    let dropped = if cur.is_empty() {
        prev.len()
    } else {
        let first = cur.position_slot(0).cloned();
        (0..prev.len()).find(|&i| prev.position_slot(i) == first.as_ref()).unwrap_or(prev.len())
    };
    let survived = prev.len().saturating_sub(dropped);
    let tail_start = survived.min(cur.len());
    let tail = (tail_start..cur.len()).filter_map(|i| cur.position_slot(i).cloned()).collect();
    (dropped, tail)
}
