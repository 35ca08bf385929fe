//! Deterministic fixtures shared by the unit tests.

use crate::engine::{DesignEngine, EngineError, EngineOutput};
use crate::params::{ParamMap, ParamValue, names};
use crate::sequence::{find_all_subsequences, reverse_complement};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::{Value, json};
use std::cell::RefCell;

pub(crate) fn random_template(len: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| b"ACGT"[rng.random_range(0..4)] as char)
        .collect()
}

/// Stands in for primer3 in `check_primers`-like use: both supplied primers
/// must be found verbatim in the template, fit `PRIMER_MAX_SIZE`, span a
/// product inside `PRIMER_PRODUCT_SIZE_RANGE`, and pass the Tm rule.
#[derive(Debug, Default)]
pub(crate) struct CheckEngine {
    /// Reject every pair while `PRIMER_MIN_TM` is above this.
    pub max_min_tm: Option<f64>,
    pub fail_with: Option<EngineError>,
    pub calls: RefCell<Vec<(ParamMap, ParamMap)>>,
}

impl CheckEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepting_min_tm_up_to(mut self, tm: f64) -> Self {
        self.max_min_tm = Some(tm);
        self
    }

    pub fn failing(mut self, error: EngineError) -> Self {
        self.fail_with = Some(error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn empty(reason: &str) -> EngineOutput {
        let mut ret = EngineOutput::new();
        for label in ["LEFT", "RIGHT", "PAIR", "INTERNAL"] {
            ret.insert(format!("PRIMER_{label}_NUM_RETURNED"), json!(0));
        }
        ret.insert(
            "PRIMER_PAIR_EXPLAIN".to_string(),
            json!(format!("considered 1, {reason} 1, ok 0")),
        );
        ret
    }
}

fn str_of<'a>(map: &'a ParamMap, name: &str) -> &'a str {
    match map.get(name) {
        Some(ParamValue::Str(s)) => s.as_str(),
        _ => "",
    }
}

impl DesignEngine for CheckEngine {
    fn design(&self, sequence: &ParamMap, globals: &ParamMap) -> Result<EngineOutput, EngineError> {
        self.calls
            .borrow_mut()
            .push((sequence.clone(), globals.clone()));
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let template = str_of(sequence, names::SEQUENCE_TEMPLATE).to_ascii_uppercase();
        let left = str_of(sequence, names::SEQUENCE_PRIMER);
        let right = str_of(sequence, names::SEQUENCE_PRIMER_REVCOMP);
        let max_size = match globals.get(names::PRIMER_MAX_SIZE) {
            Some(ParamValue::Int(v)) => *v as usize,
            _ => 27,
        };
        for (name, primer) in [
            (names::SEQUENCE_PRIMER, left),
            (names::SEQUENCE_PRIMER_REVCOMP, right),
        ] {
            if primer.len() > max_size {
                return Err(EngineError::Reported {
                    message: format!("Specified {name} is longer than PRIMER_MAX_SIZE"),
                });
            }
        }
        if let (Some(limit), Some(min_tm)) = (
            self.max_min_tm,
            globals.get(names::PRIMER_MIN_TM).and_then(ParamValue::as_f64),
        ) {
            if min_tm > limit {
                return Ok(Self::empty("tm too high"));
            }
        }
        let left_hits = find_all_subsequences(template.as_bytes(), left.to_ascii_uppercase().as_bytes());
        let right_site = reverse_complement(right).to_ascii_uppercase();
        let right_hits = find_all_subsequences(template.as_bytes(), right_site.as_bytes());
        let (Some(&left_start), Some(&right_start)) = (left_hits.first(), right_hits.first()) else {
            return Ok(Self::empty("not in template"));
        };
        let right_end = right_start + right.len();
        let product = right_end as i64 - left_start as i64;
        let in_range = match globals.get(names::PRIMER_PRODUCT_SIZE_RANGE) {
            Some(ParamValue::SizeRanges(ranges)) => {
                ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&product))
            }
            _ => true,
        };
        if !in_range {
            return Ok(Self::empty("unacceptable product size"));
        }

        let mut ret = EngineOutput::new();
        let mut put = |k: &str, v: Value| {
            ret.insert(k.to_string(), v);
        };
        put("PRIMER_LEFT_NUM_RETURNED", json!(1));
        put("PRIMER_RIGHT_NUM_RETURNED", json!(1));
        put("PRIMER_PAIR_NUM_RETURNED", json!(1));
        put("PRIMER_INTERNAL_NUM_RETURNED", json!(0));
        put("PRIMER_LEFT_0", json!([left_start, left.len()]));
        put("PRIMER_LEFT_0_SEQUENCE", json!(left));
        put("PRIMER_LEFT_0_TM", json!(60.0));
        put("PRIMER_RIGHT_0", json!([right_end - 1, right.len()]));
        put("PRIMER_RIGHT_0_SEQUENCE", json!(right));
        put("PRIMER_RIGHT_0_TM", json!(60.0));
        put("PRIMER_PAIR_0_PENALTY", json!(0.5));
        put("PRIMER_PAIR_0_PRODUCT_SIZE", json!(product));
        put("PRIMER_LEFT_EXPLAIN", json!("considered 1, ok 1"));
        put("PRIMER_RIGHT_EXPLAIN", json!("considered 1, ok 1"));
        put("PRIMER_PAIR_EXPLAIN", json!("considered 1, ok 1"));
        Ok(ret)
    }
}
