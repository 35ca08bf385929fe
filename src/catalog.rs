//! The parameter catalog: name, type, default, description and category of
//! every parameter a [`ParameterSet`](crate::params::ParameterSet) may hold.
//!
//! A catalog is an explicit value. Build it once, hand it to every parameter
//! set that needs it.

use crate::error::{DesignError, Result};
use crate::params::{Category, ParamType, ParamValue, ParameterDef, names};
use std::{collections::BTreeMap, sync::Arc};

/// Parameters the resolution and reconciliation logic reads or writes.
pub const REQUIRED: &[&str] = &[
    names::SEQUENCE_ID,
    names::SEQUENCE_TEMPLATE,
    names::SEQUENCE_PRIMER,
    names::SEQUENCE_PRIMER_REVCOMP,
    names::SEQUENCE_INTERNAL_OLIGO,
    names::SEQUENCE_INCLUDED_REGION,
    names::SEQUENCE_TARGET,
    names::SEQUENCE_EXCLUDED_REGION,
    names::SEQUENCE_PRIMER_PAIR_OK_REGION_LIST,
    names::PRIMER_TASK,
    names::PRIMER_PICK_LEFT_PRIMER,
    names::PRIMER_PICK_RIGHT_PRIMER,
    names::PRIMER_PICK_INTERNAL_OLIGO,
    names::PRIMER_PICK_ANYWAY,
    names::PRIMER_NUM_RETURN,
    names::PRIMER_EXPLAIN_FLAG,
    names::PRIMER_PRODUCT_SIZE_RANGE,
    names::PRIMER_PRODUCT_OPT_SIZE,
    names::PRIMER_MIN_SIZE,
    names::PRIMER_MAX_SIZE,
    names::PRIMER_MIN_TM,
    names::PRIMER_MAX_TM,
    names::PRIMER_MAX_HAIRPIN_TH,
];

const NO_POSITION: i64 = -1_000_000;

fn extra_defs() -> Vec<ParameterDef> {
    use Category::Extra;
    use ParamType::*;
    vec![
        ParameterDef::new(
            names::SEQUENCE_PRIMER_OVERHANG,
            Str,
            "",
            Extra,
            "sequence of the overhang for the left primer",
        ),
        ParameterDef::new(
            names::SEQUENCE_PRIMER_REVCOMP_OVERHANG,
            Str,
            "",
            Extra,
            "sequence of the overhang for the right primer",
        ),
        ParameterDef::new(
            names::PRIMER_USE_OVERHANGS,
            Bool,
            false,
            Extra,
            "if true, resolve overhangs for the provided left and right primers",
        ),
        ParameterDef::new(
            names::PRIMER_LONG_OK,
            Bool,
            false,
            Extra,
            "if true, primers longer than the engine limit are trimmed and restored",
        ),
        ParameterDef::new(
            names::PRIMER_MIN_ANNEAL_CHECK,
            Int,
            12,
            Extra,
            "number of 3' bases that must match the template exactly",
        ),
        ParameterDef::new(
            names::SEQUENCE_LONG_OVERHANG,
            Str,
            "",
            Extra,
            "set internally: bases trimmed from a long left primer",
        ),
        ParameterDef::new(
            names::SEQUENCE_REVCOMP_LONG_OVERHANG,
            Str,
            "",
            Extra,
            "set internally: bases trimmed from a long right primer",
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct ParameterCatalog {
    defs: Arc<BTreeMap<String, ParameterDef>>,
}

impl ParameterCatalog {
    /// Builds a catalog from external records. Every default must match its
    /// declared type and every [`REQUIRED`] name must be present. The extra
    /// parameters are always added.
    pub fn from_defs(defs: impl IntoIterator<Item = ParameterDef>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for mut def in defs {
            def.default = def.validate(def.default.clone())?;
            map.insert(def.name.clone(), def);
        }
        for def in extra_defs() {
            map.insert(def.name.clone(), def);
        }
        let missing: Vec<String> = REQUIRED
            .iter()
            .filter(|name| !map.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DesignError::MissingCatalogKeys(missing));
        }
        Ok(Self {
            defs: Arc::new(map),
        })
    }

    /// Parses a JSON array of `{name, type, default, description, category}`.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let defs: Vec<ParameterDef> = serde_json::from_str(text)?;
        Self::from_defs(defs)
    }

    pub fn load_from_path(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn save_to_path(&self, path: &str) -> Result<()> {
        let defs: Vec<&ParameterDef> = self.defs.values().collect();
        std::fs::write(path, serde_json::to_string_pretty(&defs)?)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDef> {
        self.defs.get(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterDef> {
        self.defs.values()
    }

    pub(crate) fn defs(&self) -> Arc<BTreeMap<String, ParameterDef>> {
        Arc::clone(&self.defs)
    }

    /// The primer3 parameters this crate knows about, with primer3's own
    /// defaults.
    pub fn primer3_defaults() -> Self {
        let defs = primer3_defs();
        let mut map: BTreeMap<String, ParameterDef> =
            defs.into_iter().map(|d| (d.name.clone(), d)).collect();
        for def in extra_defs() {
            map.insert(def.name.clone(), def);
        }
        Self {
            defs: Arc::new(map),
        }
    }
}

impl Default for ParameterCatalog {
    fn default() -> Self {
        Self::primer3_defaults()
    }
}

fn primer3_defs() -> Vec<ParameterDef> {
    use Category::{Global, Other, Program, Sequence};
    use ParamType::*;
    fn d(
        name: &str,
        ty: ParamType,
        default: ParamValue,
        category: Category,
        description: &str,
    ) -> ParameterDef {
        ParameterDef::new(name, ty, default, category, description)
    }
    let no_regions = || ParamValue::Intervals(vec![]);
    vec![
        d(names::SEQUENCE_ID, Str, "".into(), Sequence, "identifier for the sequence"),
        d(names::SEQUENCE_TEMPLATE, Str, "".into(), Sequence, "template sequence"),
        d(names::SEQUENCE_INCLUDED_REGION, IntervalList, no_regions(), Sequence, "region in which to pick primers"),
        d(names::SEQUENCE_TARGET, IntervalList, no_regions(), Sequence, "regions that primer pairs must flank"),
        d(names::SEQUENCE_EXCLUDED_REGION, IntervalList, no_regions(), Sequence, "regions primers may not overlap"),
        d("SEQUENCE_INTERNAL_EXCLUDED_REGION", IntervalList, no_regions(), Sequence, "regions internal oligos may not overlap"),
        d(names::SEQUENCE_PRIMER_PAIR_OK_REGION_LIST, QuadrupleList, ParamValue::Quadruples(vec![]), Sequence, "left/right regions primers must come from"),
        d("SEQUENCE_OVERLAP_JUNCTION_LIST", IntList, ParamValue::IntList(vec![]), Sequence, "junctions primers must overlap"),
        d(names::SEQUENCE_PRIMER, Str, "".into(), Sequence, "left primer to check or design around"),
        d(names::SEQUENCE_PRIMER_REVCOMP, Str, "".into(), Sequence, "right primer to check or design around"),
        d(names::SEQUENCE_INTERNAL_OLIGO, Str, "".into(), Sequence, "internal oligo to check or design around"),
        d("SEQUENCE_QUALITY", IntList, ParamValue::IntList(vec![]), Sequence, "per-base quality scores"),
        d("SEQUENCE_START_CODON_POSITION", Int, NO_POSITION.into(), Sequence, "index of the first base of a start codon"),
        d("SEQUENCE_FORCE_LEFT_START", Int, NO_POSITION.into(), Sequence, "forced 5' position of the left primer"),
        d("SEQUENCE_FORCE_LEFT_END", Int, NO_POSITION.into(), Sequence, "forced 3' position of the left primer"),
        d("SEQUENCE_FORCE_RIGHT_START", Int, NO_POSITION.into(), Sequence, "forced 5' position of the right primer"),
        d("SEQUENCE_FORCE_RIGHT_END", Int, NO_POSITION.into(), Sequence, "forced 3' position of the right primer"),
        d(names::PRIMER_TASK, Str, "generic".into(), Global, "task to perform"),
        d(names::PRIMER_PICK_LEFT_PRIMER, Bool, true.into(), Global, "pick a left primer"),
        d(names::PRIMER_PICK_INTERNAL_OLIGO, Bool, false.into(), Global, "pick an internal oligo"),
        d(names::PRIMER_PICK_RIGHT_PRIMER, Bool, true.into(), Global, "pick a right primer"),
        d(names::PRIMER_PICK_ANYWAY, Bool, false.into(), Global, "use supplied primers even if they violate constraints"),
        d(names::PRIMER_NUM_RETURN, Int, 5.into(), Global, "maximum number of results to return"),
        d(names::PRIMER_EXPLAIN_FLAG, Bool, false.into(), Global, "report statistics on rejected oligos"),
        d("PRIMER_FIRST_BASE_INDEX", Int, 0.into(), Global, "index of the first template base"),
        d(names::PRIMER_PRODUCT_SIZE_RANGE, SizeRangeList, ParamValue::SizeRanges(vec![(100, 300)]), Global, "allowed product sizes"),
        d(names::PRIMER_PRODUCT_OPT_SIZE, Int, 0.into(), Global, "optimum product size"),
        d(names::PRIMER_OPT_SIZE, Int, 20.into(), Global, "optimum primer length"),
        d(names::PRIMER_MIN_SIZE, Int, 18.into(), Global, "minimum primer length"),
        d(names::PRIMER_MAX_SIZE, Int, 27.into(), Global, "maximum primer length"),
        d(names::PRIMER_OPT_TM, Float, 60.0.into(), Global, "optimum melting temperature"),
        d(names::PRIMER_MIN_TM, Float, 57.0.into(), Global, "minimum melting temperature"),
        d(names::PRIMER_MAX_TM, Float, 63.0.into(), Global, "maximum melting temperature"),
        d("PRIMER_PAIR_MAX_DIFF_TM", Float, 100.0.into(), Global, "maximum Tm difference within a pair"),
        d("PRIMER_MIN_GC", Float, 20.0.into(), Global, "minimum GC percent"),
        d("PRIMER_OPT_GC_PERCENT", Float, 50.0.into(), Global, "optimum GC percent"),
        d("PRIMER_MAX_GC", Float, 80.0.into(), Global, "maximum GC percent"),
        d("PRIMER_GC_CLAMP", Int, 0.into(), Global, "number of G/C required at the 3' end"),
        d("PRIMER_MAX_POLY_X", Int, 5.into(), Global, "longest allowed mononucleotide run"),
        d("PRIMER_MAX_NS_ACCEPTED", Int, 0.into(), Global, "maximum number of Ns in a primer"),
        d("PRIMER_MAX_END_STABILITY", Float, 100.0.into(), Global, "maximum 3' end stability"),
        d("PRIMER_THERMODYNAMIC_OLIGO_ALIGNMENT", Bool, true.into(), Global, "use thermodynamic alignment"),
        d("PRIMER_MAX_SELF_ANY_TH", Float, 47.0.into(), Global, "maximum self complementarity"),
        d("PRIMER_MAX_SELF_END_TH", Float, 47.0.into(), Global, "maximum 3' self complementarity"),
        d(names::PRIMER_MAX_HAIRPIN_TH, Float, 47.0.into(), Global, "maximum hairpin stability"),
        d("PRIMER_PAIR_MAX_COMPL_ANY_TH", Float, 47.0.into(), Global, "maximum pair complementarity"),
        d("PRIMER_PAIR_MAX_COMPL_END_TH", Float, 47.0.into(), Global, "maximum pair 3' complementarity"),
        d("PRIMER_SALT_MONOVALENT", Float, 50.0.into(), Global, "monovalent cation concentration (mM)"),
        d("PRIMER_SALT_DIVALENT", Float, 1.5.into(), Global, "divalent cation concentration (mM)"),
        d("PRIMER_DNTP_CONC", Float, 0.6.into(), Global, "dNTP concentration (mM)"),
        d("PRIMER_DNA_CONC", Float, 50.0.into(), Global, "annealing oligo concentration (nM)"),
        d("PRIMER_INSIDE_PENALTY", Float, (-1.0).into(), Global, "penalty for primers inside a target"),
        d("PRIMER_OUTSIDE_PENALTY", Float, 0.0.into(), Global, "penalty per base outside a target"),
        d("PRIMER_MIN_THREE_PRIME_DISTANCE", Int, (-1).into(), Global, "minimum 3' distance between returned primers"),
        d("PRIMER_LIBERAL_BASE", Bool, false.into(), Global, "accept IUPAC codes in supplied primers"),
        d("PRIMER_INTERNAL_OPT_SIZE", Int, 20.into(), Global, "optimum internal oligo length"),
        d("PRIMER_INTERNAL_MIN_SIZE", Int, 18.into(), Global, "minimum internal oligo length"),
        d("PRIMER_INTERNAL_MAX_SIZE", Int, 27.into(), Global, "maximum internal oligo length"),
        d("PRIMER_INTERNAL_OPT_TM", Float, 60.0.into(), Global, "optimum internal oligo Tm"),
        d("PRIMER_INTERNAL_MIN_TM", Float, 57.0.into(), Global, "minimum internal oligo Tm"),
        d("PRIMER_INTERNAL_MAX_TM", Float, 63.0.into(), Global, "maximum internal oligo Tm"),
        d("PRIMER_THERMODYNAMIC_PARAMETERS_PATH", Str, "".into(), Global, "directory with thermodynamic parameter files"),
        d("P3_FILE_FLAG", Bool, false.into(), Program, "write intermediate files"),
        d("P3_FILE_ID", Str, "".into(), Program, "prefix for intermediate files"),
        d("P3_COMMENT", Str, "".into(), Other, "free-form comment"),
    ]
}
