//! Relaxation gradients: how to loosen numeric constraints, one step at a
//! time, when a design comes back empty.

use crate::error::{DesignError, Result};
use crate::params::{ParamValue, ParameterSet, names};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStep {
    pub name: String,
    pub delta: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelaxationGradient {
    pub steps: Vec<GradientStep>,
}

pub fn clip(x: f64, min: f64, max: f64) -> f64 {
    x.min(max).max(min)
}

impl RelaxationGradient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, name: &str, delta: f64, min: f64, max: f64) -> Self {
        self.steps.push(GradientStep {
            name: name.to_string(),
            delta,
            min,
            max,
        });
        self
    }

    /// Widens size, Tm and hairpin limits, bounded by the catalog defaults
    /// on the side they start from.
    pub fn from_defaults(params: &ParameterSet) -> Result<Self> {
        let default = |name: &str| -> Result<f64> {
            let def = params.def(name)?;
            def.default
                .as_f64()
                .ok_or_else(|| DesignError::validation(name, "default is not numeric"))
        };
        Ok(Self::new()
            .step(names::PRIMER_MAX_SIZE, 1.0, default(names::PRIMER_MAX_SIZE)?, 36.0)
            .step(names::PRIMER_MIN_SIZE, -1.0, 16.0, default(names::PRIMER_MAX_SIZE)?)
            .step(names::PRIMER_MAX_TM, 1.0, default(names::PRIMER_MAX_TM)?, 80.0)
            .step(names::PRIMER_MIN_TM, -1.0, 48.0, default(names::PRIMER_MIN_TM)?)
            .step(
                names::PRIMER_MAX_HAIRPIN_TH,
                1.0,
                default(names::PRIMER_MAX_HAIRPIN_TH)?,
                60.0,
            ))
    }

    /// Lowers the upper bound of the step for `name`, if there is one.
    pub fn cap(mut self, name: &str, max: f64) -> Self {
        for step in self.steps.iter_mut().filter(|s| s.name == name) {
            step.max = step.max.min(max);
        }
        self
    }

    /// The values one more step would assign. Parameters already at their
    /// bound are left out, so an empty update means the gradient is spent.
    pub fn next_update(&self, params: &ParameterSet) -> Result<Vec<(String, ParamValue)>> {
        let mut ret = vec![];
        for step in &self.steps {
            let current = params.get(&step.name)?;
            let next = match current {
                ParamValue::Int(v) => ParamValue::Int(
                    clip(*v as f64 + step.delta, step.min, step.max).round() as i64,
                ),
                ParamValue::Float(v) => {
                    ParamValue::Float(clip(v + step.delta, step.min, step.max))
                }
                other => {
                    return Err(DesignError::validation(
                        &step.name,
                        format!("cannot relax a {:?} parameter", other.kind()),
                    ));
                }
            };
            if &next != current {
                ret.push((step.name.clone(), next));
            }
        }
        Ok(ret)
    }
}

pub fn describe_update(update: &[(String, ParamValue)]) -> String {
    update.iter().map(|(k, v)| format!("{k}={v}")).join(", ")
}
