//! Typed, validated parameter storage.
//!
//! Every parameter is declared by a [`ParameterDef`] coming from a
//! [`ParameterCatalog`](crate::catalog::ParameterCatalog). A [`ParameterSet`]
//! owns one value per declared parameter; assignments are coerced to the
//! declared [`ParamType`] or rejected.

use crate::catalog::ParameterCatalog;
use crate::error::{DesignError, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, sync::Arc};

pub mod names {
    pub const SEQUENCE_ID: &str = "SEQUENCE_ID";
    pub const SEQUENCE_TEMPLATE: &str = "SEQUENCE_TEMPLATE";
    pub const SEQUENCE_PRIMER: &str = "SEQUENCE_PRIMER";
    pub const SEQUENCE_PRIMER_REVCOMP: &str = "SEQUENCE_PRIMER_REVCOMP";
    pub const SEQUENCE_INTERNAL_OLIGO: &str = "SEQUENCE_INTERNAL_OLIGO";
    pub const SEQUENCE_INCLUDED_REGION: &str = "SEQUENCE_INCLUDED_REGION";
    pub const SEQUENCE_TARGET: &str = "SEQUENCE_TARGET";
    pub const SEQUENCE_EXCLUDED_REGION: &str = "SEQUENCE_EXCLUDED_REGION";
    pub const SEQUENCE_PRIMER_PAIR_OK_REGION_LIST: &str = "SEQUENCE_PRIMER_PAIR_OK_REGION_LIST";

    pub const PRIMER_TASK: &str = "PRIMER_TASK";
    pub const PRIMER_PICK_LEFT_PRIMER: &str = "PRIMER_PICK_LEFT_PRIMER";
    pub const PRIMER_PICK_RIGHT_PRIMER: &str = "PRIMER_PICK_RIGHT_PRIMER";
    pub const PRIMER_PICK_INTERNAL_OLIGO: &str = "PRIMER_PICK_INTERNAL_OLIGO";
    pub const PRIMER_PICK_ANYWAY: &str = "PRIMER_PICK_ANYWAY";
    pub const PRIMER_NUM_RETURN: &str = "PRIMER_NUM_RETURN";
    pub const PRIMER_EXPLAIN_FLAG: &str = "PRIMER_EXPLAIN_FLAG";
    pub const PRIMER_PRODUCT_SIZE_RANGE: &str = "PRIMER_PRODUCT_SIZE_RANGE";
    pub const PRIMER_PRODUCT_OPT_SIZE: &str = "PRIMER_PRODUCT_OPT_SIZE";
    pub const PRIMER_OPT_SIZE: &str = "PRIMER_OPT_SIZE";
    pub const PRIMER_MIN_SIZE: &str = "PRIMER_MIN_SIZE";
    pub const PRIMER_MAX_SIZE: &str = "PRIMER_MAX_SIZE";
    pub const PRIMER_OPT_TM: &str = "PRIMER_OPT_TM";
    pub const PRIMER_MIN_TM: &str = "PRIMER_MIN_TM";
    pub const PRIMER_MAX_TM: &str = "PRIMER_MAX_TM";
    pub const PRIMER_MAX_HAIRPIN_TH: &str = "PRIMER_MAX_HAIRPIN_TH";

    // Consumed here, never sent to the engine.
    pub const SEQUENCE_PRIMER_OVERHANG: &str = "SEQUENCE_PRIMER_OVERHANG";
    pub const SEQUENCE_PRIMER_REVCOMP_OVERHANG: &str = "SEQUENCE_PRIMER_REVCOMP_OVERHANG";
    pub const PRIMER_USE_OVERHANGS: &str = "PRIMER_USE_OVERHANGS";
    pub const PRIMER_LONG_OK: &str = "PRIMER_LONG_OK";
    pub const PRIMER_MIN_ANNEAL_CHECK: &str = "PRIMER_MIN_ANNEAL_CHECK";
    pub const SEQUENCE_LONG_OVERHANG: &str = "_SEQUENCE_LONG_OVERHANG";
    pub const SEQUENCE_REVCOMP_LONG_OVERHANG: &str = "_SEQUENCE_REVCOMP_LONG_OVERHANG";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Sequence,
    Global,
    Program,
    Other,
    Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Str,
    Int,
    Float,
    Bool,
    IntList,
    /// `<start>,<length>` pairs
    IntervalList,
    /// `<min>-<max>` pairs
    SizeRangeList,
    QuadrupleList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    IntList(Vec<i64>),
    Intervals(Vec<(i64, i64)>),
    SizeRanges(Vec<(i64, i64)>),
    Quadruples(Vec<[i64; 4]>),
}

impl ParamValue {
    pub fn kind(&self) -> ParamType {
        match self {
            ParamValue::Bool(_) => ParamType::Bool,
            ParamValue::Int(_) => ParamType::Int,
            ParamValue::Float(_) => ParamType::Float,
            ParamValue::Str(_) => ParamType::Str,
            ParamValue::IntList(_) => ParamType::IntList,
            ParamValue::Intervals(_) => ParamType::IntervalList,
            ParamValue::SizeRanges(_) => ParamType::SizeRangeList,
            ParamValue::Quadruples(_) => ParamType::QuadrupleList,
        }
    }

    /// Empty strings and empty lists. Numbers and flags are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Str(v) => v.is_empty(),
            ParamValue::IntList(v) => v.is_empty(),
            ParamValue::Intervals(v) | ParamValue::SizeRanges(v) => v.is_empty(),
            ParamValue::Quadruples(v) => v.is_empty(),
            ParamValue::Bool(_) | ParamValue::Int(_) | ParamValue::Float(_) => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Converts the value into the representation of `ty`, if there is a
    /// lossless one.
    pub fn coerce(self, ty: ParamType) -> Option<ParamValue> {
        if self.kind() == ty {
            return Some(self);
        }
        match (self, ty) {
            (ParamValue::Int(v), ParamType::Float) => Some(ParamValue::Float(v as f64)),
            (ParamValue::Int(v @ (0 | 1)), ParamType::Bool) => Some(ParamValue::Bool(v == 1)),
            (ParamValue::Bool(v), ParamType::Int) => Some(ParamValue::Int(v as i64)),
            (ParamValue::Intervals(v), ParamType::SizeRangeList) => Some(ParamValue::SizeRanges(v)),
            (ParamValue::SizeRanges(v), ParamType::IntervalList) => Some(ParamValue::Intervals(v)),
            (ParamValue::IntList(v), ParamType::IntervalList) => {
                Self::single_pair(&v).map(ParamValue::Intervals)
            }
            (ParamValue::IntList(v), ParamType::SizeRangeList) => {
                Self::single_pair(&v).map(ParamValue::SizeRanges)
            }
            (ParamValue::IntList(v), ParamType::QuadrupleList) => match v.as_slice() {
                [] => Some(ParamValue::Quadruples(vec![])),
                [a, b, c, d] => Some(ParamValue::Quadruples(vec![[*a, *b, *c, *d]])),
                _ => None,
            },
            _ => None,
        }
    }

    fn single_pair(v: &[i64]) -> Option<Vec<(i64, i64)>> {
        match v {
            [] => Some(vec![]),
            [a, b] => Some(vec![(*a, *b)]),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(v) => write!(f, "{v}"),
            ParamValue::IntList(v) => write!(f, "[{}]", v.iter().join(", ")),
            ParamValue::Intervals(v) | ParamValue::SizeRanges(v) => write!(
                f,
                "[{}]",
                v.iter().map(|(a, b)| format!("({a}, {b})")).join(", ")
            ),
            ParamValue::Quadruples(v) => write!(
                f,
                "[{}]",
                v.iter().map(|q| format!("{q:?}")).join(", ")
            ),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<&String> for ParamValue {
    fn from(v: &String) -> Self {
        ParamValue::Str(v.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(v: Vec<i64>) -> Self {
        ParamValue::IntList(v)
    }
}

impl From<(i64, i64)> for ParamValue {
    fn from(v: (i64, i64)) -> Self {
        ParamValue::Intervals(vec![v])
    }
}

impl From<Vec<(i64, i64)>> for ParamValue {
    fn from(v: Vec<(i64, i64)>) -> Self {
        ParamValue::Intervals(v)
    }
}

impl From<Vec<[i64; 4]>> for ParamValue {
    fn from(v: Vec<[i64; 4]>) -> Self {
        ParamValue::Quadruples(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub default: ParamValue,
    #[serde(default)]
    pub description: String,
    pub category: Category,
}

impl ParameterDef {
    pub fn new(
        name: &str,
        param_type: ParamType,
        default: impl Into<ParamValue>,
        category: Category,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            default: default.into(),
            description: description.to_string(),
            category,
        }
    }

    pub fn validate(&self, value: ParamValue) -> Result<ParamValue> {
        let kind = value.kind();
        value.coerce(self.param_type).ok_or_else(|| {
            DesignError::validation(
                &self.name,
                format!("must be of type {:?}, not {:?}", self.param_type, kind),
            )
        })
    }
}

pub type ParamMap = BTreeMap<String, ParamValue>;

/// Values captured by [`ParameterSet::snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(ParamMap);

#[derive(Debug, Clone)]
pub struct ParameterSet {
    defs: Arc<BTreeMap<String, ParameterDef>>,
    values: ParamMap,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::from_catalog(&ParameterCatalog::primer3_defaults())
    }
}

impl ParameterSet {
    const POST_LOAD_DEFAULTS: [(&'static str, bool); 1] = [(names::PRIMER_EXPLAIN_FLAG, true)];

    pub fn from_catalog(catalog: &ParameterCatalog) -> Self {
        let defs = catalog.defs();
        let values = defs
            .values()
            .map(|def| (def.name.clone(), def.default.clone()))
            .collect();
        let mut ret = Self { defs, values };
        for (name, value) in Self::POST_LOAD_DEFAULTS {
            if let Some(def) = ret.defs.get(name) {
                if let Ok(v) = def.validate(value.into()) {
                    ret.values.insert(name.to_string(), v);
                }
            }
        }
        ret
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn def(&self, name: &str) -> Result<&ParameterDef> {
        self.defs
            .get(name)
            .ok_or_else(|| DesignError::UnknownParameter(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<&ParamValue> {
        self.values
            .get(name)
            .ok_or_else(|| DesignError::UnknownParameter(name.to_string()))
    }

    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<()> {
        let value = self.def(name)?.validate(value.into())?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Assigns several values. Stops at the first invalid one.
    pub fn update<I, K, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        for (name, value) in values {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    pub fn str_value(&self, name: &str) -> Result<&str> {
        match self.get(name)? {
            ParamValue::Str(v) => Ok(v),
            other => Err(Self::wrong_kind(name, ParamType::Str, other)),
        }
    }

    pub fn int_value(&self, name: &str) -> Result<i64> {
        match self.get(name)? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(Self::wrong_kind(name, ParamType::Int, other)),
        }
    }

    pub fn float_value(&self, name: &str) -> Result<f64> {
        let value = self.get(name)?;
        value
            .as_f64()
            .ok_or_else(|| Self::wrong_kind(name, ParamType::Float, value))
    }

    pub fn bool_value(&self, name: &str) -> Result<bool> {
        match self.get(name)? {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(Self::wrong_kind(name, ParamType::Bool, other)),
        }
    }

    pub fn ranges_value(&self, name: &str) -> Result<&[(i64, i64)]> {
        match self.get(name)? {
            ParamValue::Intervals(v) | ParamValue::SizeRanges(v) => Ok(v),
            other => Err(Self::wrong_kind(name, ParamType::SizeRangeList, other)),
        }
    }

    fn wrong_kind(name: &str, expected: ParamType, found: &ParamValue) -> DesignError {
        DesignError::validation(
            name,
            format!("expected a {:?} value, found {:?}", expected, found.kind()),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn by_category(&self, category: Category) -> ParamMap {
        self.values
            .iter()
            .filter(|(name, _)| {
                self.defs
                    .get(name.as_str())
                    .is_some_and(|def| def.category == category)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drops empty strings and empty lists, which the engine rejects.
    /// `SEQUENCE_ID` is kept even when empty.
    pub fn clean(map: ParamMap) -> ParamMap {
        map.into_iter()
            .filter(|(k, v)| k == names::SEQUENCE_ID || !v.is_empty())
            .collect()
    }

    pub fn sequence_map(&self) -> ParamMap {
        Self::clean(self.by_category(Category::Sequence))
    }

    pub fn global_map(&self) -> ParamMap {
        Self::clean(self.by_category(Category::Global))
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        let default = self.def(name)?.default.clone();
        self.values.insert(name.to_string(), default);
        Ok(())
    }

    pub fn set_defaults(&mut self) {
        for (name, def) in self.defs.iter() {
            self.values.insert(name.clone(), def.default.clone());
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.values.clone())
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.values = snapshot.0;
    }

    /// Names whose value differs from `snapshot`.
    pub fn changed_since(&self, snapshot: &Snapshot) -> Vec<String> {
        self.values
            .iter()
            .filter(|(k, v)| snapshot.0.get(k.as_str()) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn save_to_path(&self, path: &str) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Applies a JSON object of `name: value` pairs on top of the current
    /// values, validating each one.
    pub fn load_values_from_path(&mut self, path: &str) -> Result<()> {
        let text = std::fs::read_to_string(path)?;
        let values: ParamMap = serde_json::from_str(&text)?;
        self.update(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_and_get() {
        let mut params = ParameterSet::default();
        params.set(names::SEQUENCE_TEMPLATE, "agtacaga").unwrap();
        assert_eq!(params.str_value(names::SEQUENCE_TEMPLATE).unwrap(), "agtacaga");
    }

    #[test]
    fn test_unknown_parameter() {
        let mut params = ParameterSet::default();
        let err = params.set("NOT_A_PARAMETER", 1).unwrap_err();
        assert!(matches!(err, DesignError::UnknownParameter(_)));
        assert!(params.get("NOT_A_PARAMETER").is_err());
    }

    #[test]
    fn test_type_is_enforced() {
        let mut params = ParameterSet::default();
        let err = params.set(names::PRIMER_MAX_SIZE, "long").unwrap_err();
        assert!(matches!(err, DesignError::Validation { .. }));
        let err = params.set(names::PRIMER_MAX_SIZE, 27.5).unwrap_err();
        assert!(matches!(err, DesignError::Validation { .. }));
        assert_eq!(params.int_value(names::PRIMER_MAX_SIZE).unwrap(), 27);
    }

    #[test]
    fn test_coercion() {
        let mut params = ParameterSet::default();
        params.set(names::PRIMER_MAX_TM, 70).unwrap();
        assert_eq!(params.get(names::PRIMER_MAX_TM).unwrap(), &ParamValue::Float(70.0));
        params.set(names::PRIMER_PICK_ANYWAY, 1).unwrap();
        assert!(params.bool_value(names::PRIMER_PICK_ANYWAY).unwrap());
        assert!(params.set(names::PRIMER_PICK_ANYWAY, 2).is_err());
        params
            .set(names::PRIMER_PRODUCT_SIZE_RANGE, vec![(900, 1000)])
            .unwrap();
        assert_eq!(
            params.get(names::PRIMER_PRODUCT_SIZE_RANGE).unwrap(),
            &ParamValue::SizeRanges(vec![(900, 1000)])
        );
        params
            .set(names::SEQUENCE_INCLUDED_REGION, vec![500i64, 700])
            .unwrap();
        assert_eq!(
            params.ranges_value(names::SEQUENCE_INCLUDED_REGION).unwrap(),
            &[(500, 700)]
        );
        params
            .set(names::SEQUENCE_PRIMER_PAIR_OK_REGION_LIST, vec![1i64, 2, -1, -1])
            .unwrap();
        assert_eq!(
            params
                .get(names::SEQUENCE_PRIMER_PAIR_OK_REGION_LIST)
                .unwrap(),
            &ParamValue::Quadruples(vec![[1, 2, -1, -1]])
        );
    }

    #[test]
    fn test_explain_flag_is_on_after_load() {
        let params = ParameterSet::default();
        assert!(params.bool_value(names::PRIMER_EXPLAIN_FLAG).unwrap());
    }

    #[test]
    fn test_category_maps_are_cleaned() {
        let mut params = ParameterSet::default();
        params.set(names::SEQUENCE_TEMPLATE, "ACGT").unwrap();
        params.set(names::SEQUENCE_PRIMER_OVERHANG, "GGG").unwrap();
        let seq = params.sequence_map();
        assert!(seq.contains_key(names::SEQUENCE_TEMPLATE));
        assert!(seq.contains_key(names::SEQUENCE_ID));
        assert!(!seq.contains_key(names::SEQUENCE_PRIMER));
        assert!(!seq.contains_key(names::SEQUENCE_TARGET));
        assert!(!seq.contains_key(names::SEQUENCE_PRIMER_OVERHANG));
        let globals = params.global_map();
        assert!(globals.contains_key(names::PRIMER_PRODUCT_SIZE_RANGE));
        assert!(!globals.contains_key(names::PRIMER_USE_OVERHANGS));
        assert!(!globals.contains_key(names::SEQUENCE_TEMPLATE));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut params = ParameterSet::default();
        params.set(names::SEQUENCE_PRIMER, "ACGTACGTACGT").unwrap();
        let snapshot = params.snapshot();
        params.set(names::SEQUENCE_PRIMER, "ACGT").unwrap();
        params.set(names::PRIMER_MAX_SIZE, 30).unwrap();
        assert_eq!(
            params.changed_since(&snapshot),
            vec![names::PRIMER_MAX_SIZE.to_string(), names::SEQUENCE_PRIMER.to_string()]
        );
        params.restore(snapshot);
        assert_eq!(params.str_value(names::SEQUENCE_PRIMER).unwrap(), "ACGTACGTACGT");
        assert_eq!(params.int_value(names::PRIMER_MAX_SIZE).unwrap(), 27);
    }

    #[test]
    fn test_clones_are_independent() {
        let mut params = ParameterSet::default();
        let copy = params.clone();
        params.set(names::SEQUENCE_TEMPLATE, "ACGT").unwrap();
        assert_eq!(copy.str_value(names::SEQUENCE_TEMPLATE).unwrap(), "");
    }

    #[test]
    fn test_set_defaults() {
        let mut params = ParameterSet::default();
        params.set(names::PRIMER_MIN_TM, 40.0).unwrap();
        params.set_defaults();
        assert_eq!(params.float_value(names::PRIMER_MIN_TM).unwrap(), 57.0);
    }

    #[test]
    fn test_save_and_load_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let path = path.to_str().unwrap();

        let mut params = ParameterSet::default();
        params.set(names::SEQUENCE_TEMPLATE, "ACGTTGCA").unwrap();
        params
            .set(names::PRIMER_PRODUCT_SIZE_RANGE, vec![(50, 150), (200, 300)])
            .unwrap();
        params.save_to_path(path).unwrap();

        let mut loaded = ParameterSet::default();
        loaded.load_values_from_path(path).unwrap();
        assert_eq!(loaded.str_value(names::SEQUENCE_TEMPLATE).unwrap(), "ACGTTGCA");
        assert_eq!(
            loaded.get(names::PRIMER_PRODUCT_SIZE_RANGE).unwrap(),
            &ParamValue::SizeRanges(vec![(50, 150), (200, 300)])
        );
    }
}
