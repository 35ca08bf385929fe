//! Shaping the engine's flat output into per-pair records.

use crate::anneal::Strand;
use crate::engine::EngineOutput;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, sync::LazyLock};

pub type Fields = BTreeMap<String, Value>;

/// `{key: {reason: count}}` for every `*EXPLAIN*` key.
pub type ExplainSummary = BTreeMap<String, BTreeMap<String, i64>>;

pub const LEFT: &str = "LEFT";
pub const RIGHT: &str = "RIGHT";
pub const INTERNAL: &str = "INTERNAL";
pub const PAIR: &str = "PAIR";

const NUM_RETURNED: [&str; 3] = [
    "PRIMER_PAIR_NUM_RETURNED",
    "PRIMER_LEFT_NUM_RETURNED",
    "PRIMER_RIGHT_NUM_RETURNED",
];

static FIELD_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PRIMER_([A-Za-z]+)_(\d+)_(.+)$").expect("field key pattern is valid")
});
static LOCATION_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PRIMER_([A-Za-z]+)_(\d+)\s*$").expect("location key pattern is valid")
});
static EXPLAIN_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*([\w\s\-]+)\s+(\d+)").expect("explain token pattern is valid")
});

/// Nested `{pair_index: {label: {field: value}}}` view of one engine answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResults {
    pub pairs: BTreeMap<usize, BTreeMap<String, Fields>>,
    pub other: Fields,
}

fn num_returned(flat: &EngineOutput) -> usize {
    NUM_RETURNED
        .iter()
        .filter_map(|key| flat.get(*key).and_then(Value::as_u64))
        .max()
        .unwrap_or(0) as usize
}

pub fn parse_results(flat: &EngineOutput) -> RawResults {
    let mut ret = RawResults::default();
    for i in 0..num_returned(flat) {
        ret.pairs.entry(i).or_default();
    }
    for (key, value) in flat {
        let (caps, field) = if let Some(caps) = FIELD_KEY.captures(key) {
            let field = caps[3].to_string();
            (caps, field)
        } else if let Some(caps) = LOCATION_KEY.captures(key) {
            (caps, "location".to_string())
        } else {
            ret.other.insert(key.clone(), value.clone());
            continue;
        };
        let Ok(index) = caps[2].parse::<usize>() else {
            ret.other.insert(key.clone(), value.clone());
            continue;
        };
        ret.pairs
            .entry(index)
            .or_default()
            .entry(caps[1].to_string())
            .or_default()
            .insert(field, value.clone());
    }
    ret
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimerResult {
    pub sequence: String,
    /// `[start, length]`. For a right primer `start` is its 5' end, the
    /// right-most top-strand base it covers.
    pub location: [i64; 2],
    /// Forward for left and internal oligos, reverse for right primers.
    pub strand: Strand,
    pub overhang: String,
    /// Everything else the engine reported for this oligo (`TM`, `PENALTY`, ...).
    pub fields: Fields,
}

impl PrimerResult {
    fn from_fields(mut fields: Fields, strand: Strand) -> Self {
        let sequence = match fields.remove("SEQUENCE") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let location = fields
            .remove("location")
            .and_then(|v| serde_json::from_value::<[i64; 2]>(v).ok())
            .unwrap_or_default();
        let overhang = match fields.remove("OVERHANG") {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        Self {
            sequence,
            location,
            strand,
            overhang,
            fields,
        }
    }

    /// Overhang followed by the sequence, as it would be ordered.
    pub fn full_sequence(&self) -> String {
        format!("{}{}", self.overhang, self.sequence)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub penalty: Option<f64>,
    pub product_size: Option<i64>,
    pub fields: Fields,
}

impl PairSummary {
    fn from_fields(mut fields: Fields) -> Self {
        let penalty = fields.remove("PENALTY").and_then(|v| v.as_f64());
        let product_size = fields.remove("PRODUCT_SIZE").and_then(|v| v.as_i64());
        Self {
            penalty,
            product_size,
            fields,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    pub pair: Option<PairSummary>,
    pub left: Option<PrimerResult>,
    pub right: Option<PrimerResult>,
    pub internal: Option<PrimerResult>,
    /// Labels other than the four above, kept as reported.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Fields>,
}

impl PairResult {
    fn from_labels(labels: BTreeMap<String, Fields>) -> Self {
        let mut ret = Self::default();
        for (label, fields) in labels {
            match label.as_str() {
                PAIR => ret.pair = Some(PairSummary::from_fields(fields)),
                LEFT => ret.left = Some(PrimerResult::from_fields(fields, Strand::Forward)),
                RIGHT => ret.right = Some(PrimerResult::from_fields(fields, Strand::Reverse)),
                INTERNAL => {
                    ret.internal = Some(PrimerResult::from_fields(fields, Strand::Forward))
                }
                _ => {
                    ret.extra.insert(label, fields);
                }
            }
        }
        ret
    }

    pub fn penalty(&self) -> Option<f64> {
        self.pair.as_ref().and_then(|p| p.penalty)
    }

    pub fn product_size(&self) -> Option<i64> {
        self.pair.as_ref().and_then(|p| p.product_size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignResults {
    pub pairs: BTreeMap<usize, PairResult>,
    pub other: Fields,
}

impl DesignResults {
    pub fn from_engine(flat: &EngineOutput) -> Self {
        Self::from(parse_results(flat))
    }

    /// An empty answer carrying only `PRIMER_ERROR`.
    pub fn from_error(message: &str) -> Self {
        let mut other = Fields::new();
        other.insert("PRIMER_ERROR".to_string(), Value::String(message.to_string()));
        Self {
            pairs: BTreeMap::new(),
            other,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn error(&self) -> Option<&str> {
        self.other.get("PRIMER_ERROR").and_then(Value::as_str)
    }

    pub fn explain(&self) -> ExplainSummary {
        summarize_explain([&self.other])
    }
}

impl From<RawResults> for DesignResults {
    fn from(raw: RawResults) -> Self {
        Self {
            pairs: raw
                .pairs
                .into_iter()
                .map(|(i, labels)| (i, PairResult::from_labels(labels)))
                .collect(),
            other: raw.other,
        }
    }
}

/// Sums the `"<reason> <count>"` tokens of every `*EXPLAIN*` value.
pub fn summarize_explain<'a>(others: impl IntoIterator<Item = &'a Fields>) -> ExplainSummary {
    let mut ret = ExplainSummary::new();
    for other in others {
        for (key, value) in other.iter().filter(|(k, _)| k.contains("EXPLAIN")) {
            let Some(text) = value.as_str() else {
                continue;
            };
            for caps in EXPLAIN_TOKEN.captures_iter(text) {
                let Ok(count) = caps[2].parse::<i64>() else {
                    continue;
                };
                *ret.entry(key.clone())
                    .or_default()
                    .entry(caps[1].to_string())
                    .or_default() += count;
            }
        }
    }
    ret
}

/// All pairs of several answers, best (lowest) pair penalty first. Pairs
/// without a penalty go last.
pub fn combine_results(results: &[DesignResults]) -> (Vec<PairResult>, ExplainSummary) {
    let mut pairs: Vec<PairResult> = results
        .iter()
        .flat_map(|r| r.pairs.values().cloned())
        .collect();
    pairs.sort_by(|a, b| {
        let a = a.penalty().unwrap_or(f64::INFINITY);
        let b = b.penalty().unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
    let explain = summarize_explain(results.iter().map(|r| &r.other));
    (pairs, explain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn flat(entries: &[(&str, Value)]) -> EngineOutput {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sample() -> EngineOutput {
        flat(&[
            ("PRIMER_PAIR_NUM_RETURNED", json!(2)),
            ("PRIMER_LEFT_NUM_RETURNED", json!(2)),
            ("PRIMER_RIGHT_NUM_RETURNED", json!(3)),
            ("PRIMER_LEFT_0", json!([10, 20])),
            ("PRIMER_LEFT_0_SEQUENCE", json!("ACGTACGTACGTACGTACGT")),
            ("PRIMER_LEFT_0_TM", json!(60.1)),
            ("PRIMER_RIGHT_0", json!([300, 22])),
            ("PRIMER_RIGHT_0_SEQUENCE", json!("TTTTGGGGCCCCAAAATTTTGG")),
            ("PRIMER_PAIR_0_PENALTY", json!(1.5)),
            ("PRIMER_PAIR_0_PRODUCT_SIZE", json!(291)),
            ("PRIMER_PAIR_1_PENALTY", json!(0.25)),
            ("PRIMER_LEFT_EXPLAIN", json!("considered 10, GC content failed 3, ok 7")),
            ("PRIMER_PAIR_EXPLAIN", json!("considered 4, ok 2")),
            ("SEQUENCE_ID", json!("demo")),
        ])
    }

    #[test]
    fn test_parse_nested() {
        let raw = parse_results(&sample());
        assert_eq!(raw.pairs.len(), 3);
        assert!(raw.pairs[&2].is_empty());
        assert_eq!(raw.pairs[&0]["LEFT"]["location"], json!([10, 20]));
        assert_eq!(raw.pairs[&0]["LEFT"]["TM"], json!(60.1));
        assert_eq!(raw.pairs[&0]["PAIR"]["PRODUCT_SIZE"], json!(291));
        assert_eq!(raw.pairs[&1]["PAIR"]["PENALTY"], json!(0.25));
        assert!(raw.other.contains_key("PRIMER_LEFT_NUM_RETURNED"));
        assert!(raw.other.contains_key("PRIMER_LEFT_EXPLAIN"));
        assert!(raw.other.contains_key("SEQUENCE_ID"));
    }

    #[test]
    fn test_no_results() {
        let raw = parse_results(&flat(&[
            ("PRIMER_PAIR_NUM_RETURNED", json!(0)),
            ("PRIMER_LEFT_NUM_RETURNED", json!(0)),
            ("PRIMER_RIGHT_NUM_RETURNED", json!(0)),
        ]));
        assert!(raw.pairs.is_empty());
        assert_eq!(raw.other.len(), 3);
        assert!(DesignResults::from(raw).is_empty());
    }

    #[test]
    fn test_typed_results() {
        let results = DesignResults::from_engine(&sample());
        let first = &results.pairs[&0];
        let left = first.left.as_ref().unwrap();
        assert_eq!(left.sequence, "ACGTACGTACGTACGTACGT");
        assert_eq!(left.location, [10, 20]);
        assert_eq!(left.overhang, "");
        assert_eq!(left.strand, Strand::Forward);
        assert_eq!(left.fields["TM"], json!(60.1));
        assert!(!left.fields.contains_key("SEQUENCE"));
        let right = first.right.as_ref().unwrap();
        assert_eq!(right.location, [300, 22]);
        assert_eq!(right.strand, Strand::Reverse);
        assert_eq!(right.strand.sign(), -1);
        assert_eq!(first.penalty(), Some(1.5));
        assert_eq!(first.product_size(), Some(291));
        assert!(first.internal.is_none());
        assert_eq!(results.pairs[&2], PairResult::default());
    }

    #[test]
    fn test_summarize_explain() {
        let results = DesignResults::from_engine(&sample());
        let explain = results.explain();
        assert_eq!(explain["PRIMER_LEFT_EXPLAIN"]["considered"], 10);
        assert_eq!(explain["PRIMER_LEFT_EXPLAIN"]["GC content failed"], 3);
        assert_eq!(explain["PRIMER_LEFT_EXPLAIN"]["ok"], 7);
        assert_eq!(explain["PRIMER_PAIR_EXPLAIN"]["ok"], 2);
        assert!(!explain.contains_key("SEQUENCE_ID"));
    }

    #[test]
    fn test_combine_results_sorts_by_penalty() {
        let a = DesignResults::from_engine(&sample());
        let b = DesignResults::from_engine(&flat(&[
            ("PRIMER_PAIR_NUM_RETURNED", json!(1)),
            ("PRIMER_PAIR_0_PENALTY", json!(0.75)),
            ("PRIMER_LEFT_EXPLAIN", json!("considered 5, ok 1")),
        ]));
        let (pairs, explain) = combine_results(&[a, b]);
        let penalties: Vec<Option<f64>> = pairs.iter().map(|p| p.penalty()).collect();
        assert_eq!(penalties, vec![Some(0.25), Some(0.75), Some(1.5), None]);
        assert_eq!(explain["PRIMER_LEFT_EXPLAIN"]["considered"], 15);
        assert_eq!(explain["PRIMER_LEFT_EXPLAIN"]["ok"], 8);
    }

    #[test]
    fn test_from_error() {
        let results = DesignResults::from_error("engine exploded");
        assert!(results.is_empty());
        assert_eq!(results.error(), Some("engine exploded"));
    }
}
