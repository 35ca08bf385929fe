//! Splitting user primers into overhang and annealing region, and keeping the
//! engine's view of them within its hard length limit.
//!
//! Everything here mutates a [`ParameterSet`] in place. The orchestrator
//! snapshots the set beforehand and restores it after the run.

use crate::anneal::{Candidate, MatchRecord, Strand, anneal_forward, anneal_reverse};
use crate::error::{DesignError, Result};
use crate::params::{ParamValue, ParameterSet, names};
use crate::sequence::validate_template;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The engine refuses primers longer than this.
pub const PRIMER_MAX_SIZE_HARD_LIMIT: usize = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn strand(self) -> Strand {
        match self {
            Side::Left => Strand::Forward,
            Side::Right => Strand::Reverse,
        }
    }

    pub fn primer_param(self) -> &'static str {
        match self {
            Side::Left => names::SEQUENCE_PRIMER,
            Side::Right => names::SEQUENCE_PRIMER_REVCOMP,
        }
    }

    pub fn overhang_param(self) -> &'static str {
        match self {
            Side::Left => names::SEQUENCE_PRIMER_OVERHANG,
            Side::Right => names::SEQUENCE_PRIMER_REVCOMP_OVERHANG,
        }
    }

    /// Where bases trimmed off a long primer are kept during a run.
    pub fn stash_param(self) -> &'static str {
        match self {
            Side::Left => names::SEQUENCE_LONG_OVERHANG,
            Side::Right => names::SEQUENCE_REVCOMP_LONG_OVERHANG,
        }
    }
}

/// Locates `primer` on the strand `side` binds and returns `(overhang,
/// anneal)`. Exactly one binding site is accepted.
pub fn resolve(
    template: &str,
    primer: &str,
    min_anneal: usize,
    side: Side,
) -> Result<(String, String)> {
    let candidates = [Candidate::new(primer)];
    let mut matches: Vec<MatchRecord> = match side.strand() {
        Strand::Forward => anneal_forward(template, &candidates, min_anneal),
        Strand::Reverse => anneal_reverse(template, &candidates, min_anneal),
    };
    match matches.len() {
        0 => Err(DesignError::AnnealingNotFound { side }),
        1 => {
            let m = matches.remove(0);
            debug!("{side} primer anneals at {:?} with overhang '{}'", m.slice, m.overhang);
            Ok((m.overhang, m.anneal))
        }
        count => Err(DesignError::AmbiguousAnnealing { side, count }),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrimmedPrimer {
    pub overhang: String,
    /// Leading bases of the annealing region kept away from the engine.
    pub stashed: String,
    pub anneal: String,
}

/// Keeps the trailing `max_anneal` bases of `anneal`; the rest is stashed.
pub fn trim(overhang: &str, anneal: &str, max_anneal: usize) -> TrimmedPrimer {
    let excess = anneal.chars().count().saturating_sub(max_anneal);
    let cut = anneal
        .char_indices()
        .nth(excess)
        .map_or(anneal.len(), |(i, _)| i);
    TrimmedPrimer {
        overhang: overhang.to_string(),
        stashed: anneal[..cut].to_string(),
        anneal: anneal[cut..].to_string(),
    }
}

fn min_anneal_check(params: &ParameterSet) -> Result<usize> {
    let n = params.int_value(names::PRIMER_MIN_ANNEAL_CHECK)?;
    usize::try_from(n).map_err(|_| {
        DesignError::validation(names::PRIMER_MIN_ANNEAL_CHECK, format!("must not be negative, got {n}"))
    })
}

/// Replaces both primers by their annealing regions. The resolved overhang
/// of each primer is appended to any overhang already set for that side.
/// An empty primer leaves its side untouched apart from that concatenation.
pub fn resolve_overhangs(params: &mut ParameterSet) -> Result<()> {
    let template = params.str_value(names::SEQUENCE_TEMPLATE)?.to_string();
    validate_template(names::SEQUENCE_TEMPLATE, &template)?;
    let min_anneal = min_anneal_check(params)?;

    let mut updates = vec![];
    for side in Side::BOTH {
        let primer = params.str_value(side.primer_param())?;
        let (overhang, anneal) = if primer.is_empty() {
            (String::new(), String::new())
        } else {
            resolve(&template, primer, min_anneal, side)?
        };
        let explicit = params.str_value(side.overhang_param())?;
        updates.push((side.overhang_param(), format!("{explicit}{overhang}")));
        updates.push((side.primer_param(), anneal));
    }
    params.update(updates)
}

/// Emits (and returns) a warning per side whose explicit overhang will not
/// reach the results because `PRIMER_USE_OVERHANGS` is off.
pub fn warn_ignored_overhangs(params: &ParameterSet) -> Result<Vec<String>> {
    let mut ret = vec![];
    if params.bool_value(names::PRIMER_USE_OVERHANGS)? {
        return Ok(ret);
    }
    for side in Side::BOTH {
        let overhang = params.str_value(side.overhang_param())?;
        if !overhang.is_empty() {
            let message = format!(
                "{} is non-empty (value={}) but {} was false. Overhang was ignored",
                side.overhang_param(),
                overhang,
                names::PRIMER_USE_OVERHANGS
            );
            warn!("{message}");
            ret.push(message);
        }
    }
    Ok(ret)
}

/// Trims both primers to `limit` bases. Trimmed bases go to the stash
/// parameters and are appended to the overhang parameters, and
/// `PRIMER_MAX_SIZE` is lowered to `limit` if needed. Returns the
/// `(left, right)` stashes.
pub fn resolve_long_primers(params: &mut ParameterSet, limit: usize) -> Result<(String, String)> {
    let mut stashes = vec![];
    for side in Side::BOTH {
        let trimmed = trim(
            params.str_value(side.overhang_param())?,
            params.str_value(side.primer_param())?,
            limit,
        );
        if !trimmed.stashed.is_empty() {
            debug!("{side} primer: {} base(s) stashed", trimmed.stashed.len());
        }
        params.update([
            (
                side.overhang_param(),
                format!("{}{}", trimmed.overhang, trimmed.stashed),
            ),
            (side.stash_param(), trimmed.stashed.clone()),
            (side.primer_param(), trimmed.anneal),
        ])?;
        stashes.push(trimmed.stashed);
    }
    let limit = i64::try_from(limit)
        .map_err(|_| DesignError::validation(names::PRIMER_MAX_SIZE, "hard limit out of range"))?;
    if params.int_value(names::PRIMER_MAX_SIZE)? > limit {
        params.set(names::PRIMER_MAX_SIZE, limit)?;
    }
    let right = stashes.pop().unwrap_or_default();
    let left = stashes.pop().unwrap_or_default();
    Ok((left, right))
}

/// Shrinks every product size range by the total stash length, so the
/// engine's shortened product corresponds to the real one.
pub fn adjust_product_sizes(params: &mut ParameterSet) -> Result<()> {
    let stashed = (params.str_value(names::SEQUENCE_LONG_OVERHANG)?.len()
        + params.str_value(names::SEQUENCE_REVCOMP_LONG_OVERHANG)?.len()) as i64;
    if stashed == 0 {
        return Ok(());
    }
    let ranges: Vec<(i64, i64)> = params
        .ranges_value(names::PRIMER_PRODUCT_SIZE_RANGE)?
        .iter()
        .map(|(lo, hi)| (lo - stashed, hi - stashed))
        .collect();
    params.set(names::PRIMER_PRODUCT_SIZE_RANGE, ParamValue::SizeRanges(ranges))
}
