//! Undoing the long-primer split on the engine's answer.
//!
//! The engine only ever saw the trimmed annealing regions. For every pair the
//! stashed bases go back in front of the primer, come off the tail of its
//! reported overhang, and widen its location and the product accordingly.

use crate::resolve::Side;
use crate::results::{DesignResults, PairSummary, PrimerResult};

fn strip_tail(overhang: &mut String, n: usize) {
    let keep = overhang.chars().count().saturating_sub(n);
    let cut = overhang
        .char_indices()
        .nth(keep)
        .map_or(overhang.len(), |(i, _)| i);
    overhang.truncate(cut);
}

fn restore_stash(primer: &mut PrimerResult, stash: &str, side: Side) {
    let n = stash.len() as i64;
    primer.sequence = format!("{stash}{}", primer.sequence);
    strip_tail(&mut primer.overhang, stash.len());
    let [start, length] = primer.location;
    // the stash sits at the 5' end, which is the left edge of a left
    // primer and the right edge of a right primer
    primer.location = match side {
        Side::Left => [start - n, length + n],
        Side::Right => [start + n, length + n],
    };
}

fn grow_product(summary: Option<&mut PairSummary>, n: usize) {
    if let Some(size) = summary.and_then(|s| s.product_size.as_mut()) {
        *size += n as i64;
    }
}

pub fn reconcile(
    results: &mut DesignResults,
    left_stash: &str,
    right_stash: &str,
    left_overhang: &str,
    right_overhang: &str,
    use_overhangs: bool,
) {
    for pair in results.pairs.values_mut() {
        for (primer, stash, overhang, side) in [
            (pair.left.as_mut(), left_stash, left_overhang, Side::Left),
            (pair.right.as_mut(), right_stash, right_overhang, Side::Right),
        ] {
            let Some(primer) = primer else {
                continue;
            };
            if use_overhangs {
                primer.overhang = overhang.to_string();
            }
            if !stash.is_empty() {
                restore_stash(primer, stash, side);
            }
        }
        for stash in [left_stash, right_stash] {
            if !stash.is_empty() {
                grow_product(pair.pair.as_mut(), stash.len());
            }
        }
    }
}
