//! Locating where a primer binds a template.
//!
//! Matching is seed-and-extend: every `seed_length` window of the template is
//! compared against the trailing `seed_length` bases of each candidate (the
//! primer's 3' end). On a hit the match is grown towards the primer's 5' end
//! for as long as primer and template keep agreeing. Whatever is left of the
//! primer is its non-template overhang.
//!
//! All comparisons are case-insensitive. Reported sequences keep the case of
//! the candidate as given.
//!
//! Coordinates are always expressed on the top strand of the template as a
//! half-open `slice`. The `start` field differs per strand:
//! - forward matches: `start == slice.0`, the 5'-most top-strand base;
//! - reverse matches: `start == slice.1 - 1`, the 3'-most top-strand base of
//!   the binding site (the 5' end of the primer itself). Region lists built
//!   for the engine rely on this exact convention.

use crate::sequence::eq_ignore_case;
use bio::alphabets::dna;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl Strand {
    /// `+1` for the top strand, `-1` for the bottom strand.
    pub fn sign(self) -> i8 {
        match self {
            Strand::Forward => 1,
            Strand::Reverse => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: Option<String>,
    pub sequence: String,
}

impl Candidate {
    pub fn new(sequence: &str) -> Self {
        Self {
            name: None,
            sequence: sequence.to_string(),
        }
    }

    pub fn named(name: &str, sequence: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            sequence: sequence.to_string(),
        }
    }
}

impl From<&str> for Candidate {
    fn from(sequence: &str) -> Self {
        Candidate::new(sequence)
    }
}

impl From<String> for Candidate {
    fn from(sequence: String) -> Self {
        Self {
            name: None,
            sequence,
        }
    }
}

/// `(sequence, name)`
impl From<(&str, &str)> for Candidate {
    fn from((sequence, name): (&str, &str)) -> Self {
        Candidate::named(name, sequence)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub name: Option<String>,
    pub primer: String,
    pub anneal: String,
    pub overhang: String,
    pub start: usize,
    pub length: usize,
    pub slice: (usize, usize),
    pub strand: Strand,
}

fn extend_match(template: &[u8], primer: &[u8], seed_length: usize, end: usize) -> usize {
    let mut length = seed_length;
    while length < primer.len()
        && length < end
        && template[end - length - 1].eq_ignore_ascii_case(&primer[primer.len() - length - 1])
    {
        length += 1;
    }
    length
}

/// Scans `template` for every candidate. Records are produced in window
/// order, then candidate order, with coordinates on `template` itself.
pub fn find_matches(
    template: &str,
    candidates: &[Candidate],
    seed_length: usize,
) -> Vec<MatchRecord> {
    find_matches_bytes(template.as_bytes(), candidates, seed_length)
}

fn find_matches_bytes(
    seq: &[u8],
    candidates: &[Candidate],
    seed_length: usize,
) -> Vec<MatchRecord> {
    let mut ret = vec![];
    if seed_length == 0 || seq.len() < seed_length {
        return ret;
    }
    for start in 0..=(seq.len() - seed_length) {
        let end = start + seed_length;
        let window = &seq[start..end];
        for candidate in candidates {
            let primer = candidate.sequence.as_bytes();
            if primer.len() < seed_length
                || !eq_ignore_case(window, &primer[primer.len() - seed_length..])
            {
                continue;
            }
            let length = extend_match(seq, primer, seed_length, end);
            let split = primer.len() - length;
            ret.push(MatchRecord {
                name: candidate.name.clone(),
                primer: candidate.sequence.clone(),
                anneal: String::from_utf8_lossy(&primer[split..]).to_string(),
                overhang: String::from_utf8_lossy(&primer[..split]).to_string(),
                start: end - length,
                length,
                slice: (end - length, end),
                strand: Strand::Forward,
            });
        }
    }
    ret
}

pub fn anneal_forward(
    template: &str,
    candidates: &[Candidate],
    seed_length: usize,
) -> Vec<MatchRecord> {
    find_matches(template, candidates, seed_length)
}

/// Matches against the reverse complement, remapped onto the top strand.
pub fn anneal_reverse(
    template: &str,
    candidates: &[Candidate],
    seed_length: usize,
) -> Vec<MatchRecord> {
    // on bytes, so the complement is exactly as long as the template
    let rc = dna::revcomp(template.as_bytes());
    let n = rc.len();
    find_matches_bytes(&rc, candidates, seed_length)
        .into_iter()
        .map(|mut m| {
            let (s, e) = m.slice;
            m.slice = (n - e, n - s);
            m.start = m.slice.1 - 1;
            m.strand = Strand::Reverse;
            m
        })
        .collect()
}

/// Returns `(forward_matches, reverse_matches)`.
pub fn anneal(
    template: &str,
    candidates: &[Candidate],
    seed_length: usize,
) -> (Vec<MatchRecord>, Vec<MatchRecord>) {
    let fwd = anneal_forward(template, candidates, seed_length);
    let rev = anneal_reverse(template, candidates, seed_length);
    log::debug!(
        "anneal: {} candidate(s), seed {}: {} forward / {} reverse match(es)",
        candidates.len(),
        seed_length,
        fwd.len(),
        rev.len()
    );
    (fwd, rev)
}
