//! Named presets over a [`ParameterSet`].
//!
//! ```ignore
//! design
//!     .settings()
//!     .template(&template)?
//!     .primers(&left, &right)?
//!     .product_size(vec![(900, 1000)], None)?;
//! ```

use crate::error::{DesignError, Result};
use crate::params::{ParamValue, ParameterSet, names};
use crate::sequence::find_all_subsequences;

pub const TASK_GENERIC: &str = "generic";
pub const TASK_CHECK_PRIMERS: &str = "check_primers";
pub const TASK_PICK_PRIMER_LIST: &str = "pick_primer_list";
pub const TASK_PICK_SEQUENCING_PRIMERS: &str = "pick_sequencing_primers";
pub const TASK_PICK_CLONING_PRIMERS: &str = "pick_cloning_primers";
pub const TASK_PICK_DISCRIMINATIVE_PRIMERS: &str = "pick_discriminative_primers";

/// A template region, either as `(start, length)` intervals or as a
/// subsequence to look up in the current template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    Intervals(Vec<(i64, i64)>),
    Sequence(String),
}

impl From<(i64, i64)> for Region {
    fn from(v: (i64, i64)) -> Self {
        Region::Intervals(vec![v])
    }
}

impl From<Vec<(i64, i64)>> for Region {
    fn from(v: Vec<(i64, i64)>) -> Self {
        Region::Intervals(v)
    }
}

impl From<&str> for Region {
    fn from(v: &str) -> Self {
        Region::Sequence(v.to_string())
    }
}

pub struct Settings<'a> {
    params: &'a mut ParameterSet,
}

impl<'a> Settings<'a> {
    pub fn new(params: &'a mut ParameterSet) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ParameterSet {
        self.params
    }

    pub fn update(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<&mut Self> {
        self.params.set(name, value)?;
        Ok(self)
    }

    pub fn task(&mut self, task: &str) -> Result<&mut Self> {
        self.update(names::PRIMER_TASK, task)
    }

    pub fn as_cloning_task(&mut self) -> Result<&mut Self> {
        self.task(TASK_PICK_CLONING_PRIMERS)
    }

    pub fn as_generic_task(&mut self) -> Result<&mut Self> {
        self.task(TASK_GENERIC)
    }

    pub fn template(&mut self, template: &str) -> Result<&mut Self> {
        self.update(names::SEQUENCE_TEMPLATE, template)
    }

    pub fn primer_num_return(&mut self, n: i64) -> Result<&mut Self> {
        self.update(names::PRIMER_NUM_RETURN, n)
    }

    pub fn product_size(&mut self, ranges: Vec<(i64, i64)>, opt: Option<i64>) -> Result<&mut Self> {
        self.update(names::PRIMER_PRODUCT_SIZE_RANGE, ParamValue::SizeRanges(ranges))?;
        if let Some(opt) = opt {
            self.update(names::PRIMER_PRODUCT_OPT_SIZE, opt)?;
        }
        Ok(self)
    }

    pub fn pair_region_list(&mut self, regions: Vec<[i64; 4]>) -> Result<&mut Self> {
        self.update(names::SEQUENCE_PRIMER_PAIR_OK_REGION_LIST, regions)
    }

    /// Sets the left primer and asks for right primers to go with it.
    pub fn left_sequence(&mut self, primer: &str) -> Result<&mut Self> {
        self.update(names::SEQUENCE_PRIMER, primer)?
            .update(names::PRIMER_PICK_RIGHT_PRIMER, true)
    }

    /// Sets the right primer and asks for left primers to go with it.
    pub fn right_sequence(&mut self, primer: &str) -> Result<&mut Self> {
        self.update(names::SEQUENCE_PRIMER_REVCOMP, primer)?
            .update(names::PRIMER_PICK_LEFT_PRIMER, true)
    }

    pub fn internal_sequence(&mut self, primer: &str) -> Result<&mut Self> {
        self.update(names::SEQUENCE_INTERNAL_OLIGO, primer)?
            .update(names::PRIMER_PICK_INTERNAL_OLIGO, true)
    }

    /// Empty primers are skipped.
    pub fn primers(&mut self, left: &str, right: &str) -> Result<&mut Self> {
        if !left.is_empty() {
            self.left_sequence(left)?;
        }
        if !right.is_empty() {
            self.right_sequence(right)?;
        }
        Ok(self)
    }

    pub fn left_overhang(&mut self, overhang: &str) -> Result<&mut Self> {
        self.update(names::SEQUENCE_PRIMER_OVERHANG, overhang)
    }

    pub fn right_overhang(&mut self, overhang: &str) -> Result<&mut Self> {
        self.update(names::SEQUENCE_PRIMER_REVCOMP_OVERHANG, overhang)
    }

    pub fn use_overhangs(&mut self, on: bool) -> Result<&mut Self> {
        self.update(names::PRIMER_USE_OVERHANGS, on)
    }

    pub fn long_ok(&mut self, on: bool) -> Result<&mut Self> {
        self.update(names::PRIMER_LONG_OK, on)
    }

    pub fn pick_left_only(&mut self) -> Result<&mut Self> {
        self.update(names::PRIMER_PICK_LEFT_PRIMER, true)?
            .update(names::PRIMER_PICK_RIGHT_PRIMER, false)
    }

    pub fn pick_right_only(&mut self) -> Result<&mut Self> {
        self.update(names::PRIMER_PICK_LEFT_PRIMER, false)?
            .update(names::PRIMER_PICK_RIGHT_PRIMER, true)
    }

    pub fn pick_anyway(&mut self, on: bool) -> Result<&mut Self> {
        self.update(names::PRIMER_PICK_ANYWAY, on)
    }

    /// The single region primers must be picked from.
    pub fn included(&mut self, region: impl Into<Region>) -> Result<&mut Self> {
        let intervals = self.intervals(names::SEQUENCE_INCLUDED_REGION, region.into())?;
        if intervals.len() != 1 {
            return Err(DesignError::validation(
                names::SEQUENCE_INCLUDED_REGION,
                format!("expected exactly one interval, found {}", intervals.len()),
            ));
        }
        self.update(names::SEQUENCE_INCLUDED_REGION, intervals)
    }

    pub fn target(&mut self, region: impl Into<Region>) -> Result<&mut Self> {
        let intervals = self.intervals(names::SEQUENCE_TARGET, region.into())?;
        self.update(names::SEQUENCE_TARGET, intervals)
    }

    pub fn excluded(&mut self, region: impl Into<Region>) -> Result<&mut Self> {
        let intervals = self.intervals(names::SEQUENCE_EXCLUDED_REGION, region.into())?;
        self.update(names::SEQUENCE_EXCLUDED_REGION, intervals)
    }

    fn intervals(&self, name: &str, region: Region) -> Result<Vec<(i64, i64)>> {
        match region {
            Region::Intervals(v) => Ok(v),
            Region::Sequence(seq) => {
                let template = self.params.str_value(names::SEQUENCE_TEMPLATE)?;
                let hits = find_all_subsequences(template.as_bytes(), seq.as_bytes());
                match hits.as_slice() {
                    [start] => Ok(vec![(*start as i64, seq.len() as i64)]),
                    [] => Err(DesignError::validation(name, format!("'{seq}' not in template"))),
                    _ => Err(DesignError::validation(
                        name,
                        format!("'{seq}' found {} times in template", hits.len()),
                    )),
                }
            }
        }
    }
}
