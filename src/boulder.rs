//! BoulderIO, the `KEY=VALUE` record format read and written by `primer3_core`.
//!
//! A record is a run of `KEY=VALUE` lines closed by a line holding a single
//! `=`. Values are plain text; list-valued parameters use primer3's own
//! separators.

use crate::engine::EngineOutput;
use crate::params::{ParamMap, ParamValue};
use itertools::Itertools;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::LazyLock;

pub const RECORD_END: &str = "=";

static LOCATION_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PRIMER_[A-Za-z]+_\d+$").expect("location key pattern is valid")
});

pub fn encode_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Bool(v) => if *v { "1" } else { "0" }.to_string(),
        ParamValue::Int(v) => v.to_string(),
        ParamValue::Float(v) => v.to_string(),
        ParamValue::Str(v) => v.clone(),
        ParamValue::IntList(v) => v.iter().join(" "),
        ParamValue::Intervals(v) => v.iter().map(|(s, l)| format!("{s},{l}")).join(" "),
        ParamValue::SizeRanges(v) => v.iter().map(|(a, b)| format!("{a}-{b}")).join(" "),
        ParamValue::Quadruples(v) => v.iter().map(|q| q.iter().join(",")).join(" ; "),
    }
}

/// Writes every map, in order, into one record. Later maps win on repeated
/// keys since primer3 keeps the last assignment.
pub fn encode_record(maps: &[&ParamMap]) -> String {
    let mut ret = String::new();
    for map in maps {
        for (name, value) in map.iter() {
            ret.push_str(name);
            ret.push('=');
            ret.push_str(&encode_value(value));
            ret.push('\n');
        }
    }
    ret.push_str(RECORD_END);
    ret.push('\n');
    ret
}

/// Bare location keys (`PRIMER_LEFT_0=12,20`) become `[start, length]`;
/// other values are read as an integer, then a float, then kept as text.
pub fn decode_value(key: &str, raw: &str) -> Value {
    let raw = raw.trim();
    if LOCATION_KEY.is_match(key) {
        let parts: Option<Vec<i64>> = raw.split(',').map(|p| p.trim().parse().ok()).collect();
        if let Some(parts) = parts.filter(|p| p.len() == 2) {
            return Value::from(parts);
        }
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Value::from(v);
    }
    if let Some(v) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(v);
    }
    Value::String(raw.to_string())
}

/// Splits `text` into records. A trailing record without its closing `=`
/// is still returned.
pub fn decode_records(text: &str) -> Vec<EngineOutput> {
    let mut ret = vec![];
    let mut current = EngineOutput::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line == RECORD_END {
            ret.push(std::mem::take(&mut current));
            continue;
        }
        if let Some((key, raw)) = line.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                current.insert(key.to_string(), decode_value(key, raw));
            }
        }
    }
    if !current.is_empty() {
        ret.push(current);
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::names;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_encode_values() {
        assert_eq!(encode_value(&ParamValue::Bool(true)), "1");
        assert_eq!(encode_value(&ParamValue::Bool(false)), "0");
        assert_eq!(encode_value(&ParamValue::Float(60.0)), "60");
        assert_eq!(encode_value(&ParamValue::Float(1.5)), "1.5");
        assert_eq!(encode_value(&ParamValue::IntList(vec![10, 20, 30])), "10 20 30");
        assert_eq!(
            encode_value(&ParamValue::Intervals(vec![(10, 20), (100, 5)])),
            "10,20 100,5"
        );
        assert_eq!(
            encode_value(&ParamValue::SizeRanges(vec![(100, 300), (900, 1000)])),
            "100-300 900-1000"
        );
        assert_eq!(
            encode_value(&ParamValue::Quadruples(vec![[1, 2, 3, 4], [5, 6, -1, -1]])),
            "1,2,3,4 ; 5,6,-1,-1"
        );
    }

    #[test]
    fn test_encode_record() {
        let mut seq = ParamMap::new();
        seq.insert(names::SEQUENCE_ID.to_string(), "".into());
        seq.insert(names::SEQUENCE_TEMPLATE.to_string(), "ACGT".into());
        let mut globals = ParamMap::new();
        globals.insert(names::PRIMER_EXPLAIN_FLAG.to_string(), true.into());
        let record = encode_record(&[&seq, &globals]);
        assert_eq!(
            record,
            "SEQUENCE_ID=\nSEQUENCE_TEMPLATE=ACGT\nPRIMER_EXPLAIN_FLAG=1\n=\n"
        );
    }

    #[test]
    fn test_decode_values() {
        assert_eq!(decode_value("PRIMER_LEFT_0", "12,20"), json!([12, 20]));
        assert_eq!(decode_value("PRIMER_RIGHT_3", " 980,25 "), json!([980, 25]));
        assert_eq!(decode_value("PRIMER_LEFT_0_TM", "59.812"), json!(59.812));
        assert_eq!(decode_value("PRIMER_PAIR_NUM_RETURNED", "1"), json!(1));
        assert_eq!(decode_value("PRIMER_LEFT_0_SEQUENCE", "ACGT"), json!("ACGT"));
        assert_eq!(
            decode_value("PRIMER_LEFT_EXPLAIN", "considered 10, ok 2"),
            json!("considered 10, ok 2")
        );
    }

    #[test]
    fn test_decode_records() {
        let text = "SEQUENCE_ID=x\nPRIMER_LEFT_NUM_RETURNED=1\nPRIMER_LEFT_0=5,20\n=\nSEQUENCE_ID=y\n=\n";
        let records = decode_records(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["PRIMER_LEFT_0"], json!([5, 20]));
        assert_eq!(records[0]["SEQUENCE_ID"], json!("x"));
        assert_eq!(records[1]["SEQUENCE_ID"], json!("y"));
    }

    #[test]
    fn test_decode_unterminated_record() {
        let records = decode_records("PRIMER_ERROR=bad tag\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["PRIMER_ERROR"], json!("bad tag"));
        assert!(decode_records("").is_empty());
    }
}
