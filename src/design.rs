//! The design orchestrator.
//!
//! A run walks `Built -> Resolved -> Submitted`, then either ends in
//! `Succeeded`, or goes through `Relaxed -> Submitted` until the engine
//! returns something, the iteration budget is used up, or the gradient is
//! spent (`Failed`). The parameter set is restored to its pre-run values
//! whatever the outcome.

use crate::engine::{DesignEngine, EngineError};
use crate::error::{DesignError, Result};
use crate::gradient::{RelaxationGradient, describe_update};
use crate::params::{ParamValue, ParameterSet, names};
use crate::reconcile::reconcile;
use crate::resolve::{
    PRIMER_MAX_SIZE_HARD_LIMIT, adjust_product_sizes, resolve_long_primers, resolve_overhangs,
    warn_ignored_overhangs,
};
use crate::results::{DesignResults, ExplainSummary};
use crate::settings::Settings;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DesignState {
    Built,
    Resolved,
    Submitted,
    Succeeded,
    Relaxed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignOptions {
    /// Turn engine failures into an empty answer carrying `PRIMER_ERROR`.
    pub quiet_runtime: bool,
    pub hard_size_limit: usize,
    /// Falls back to [`RelaxationGradient::from_defaults`].
    pub gradient: Option<RelaxationGradient>,
}

impl Default for DesignOptions {
    fn default() -> Self {
        Self {
            quiet_runtime: false,
            hard_size_limit: PRIMER_MAX_SIZE_HARD_LIMIT,
            gradient: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignOutcome {
    pub results: DesignResults,
    pub explain: ExplainSummary,
    pub state: DesignState,
    /// Engine calls made.
    pub attempts: usize,
    /// Every relaxation applied, in order.
    pub relaxations: Vec<Vec<(String, ParamValue)>>,
    /// Input that was accepted but had no effect, such as an explicit
    /// overhang while overhangs are off.
    pub warnings: Vec<String>,
}

impl DesignOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == DesignState::Succeeded
    }
}

pub struct Design<E> {
    engine: E,
    params: ParameterSet,
    options: DesignOptions,
    state: DesignState,
}

impl<E: DesignEngine> Design<E> {
    pub fn new(engine: E) -> Self {
        Self::with_params(engine, ParameterSet::default())
    }

    pub fn with_params(engine: E, params: ParameterSet) -> Self {
        Self {
            engine,
            params,
            options: DesignOptions::default(),
            state: DesignState::Built,
        }
    }

    pub fn with_options(mut self, options: DesignOptions) -> Self {
        self.options = options;
        self
    }

    pub fn quiet_runtime(mut self, quiet: bool) -> Self {
        self.options.quiet_runtime = quiet;
        self
    }

    pub fn with_gradient(mut self, gradient: RelaxationGradient) -> Self {
        self.options.gradient = Some(gradient);
        self
    }

    pub fn options(&self) -> &DesignOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    pub fn settings(&mut self) -> Settings<'_> {
        Settings::new(&mut self.params)
    }

    pub fn state(&self) -> DesignState {
        self.state
    }

    /// A single engine call, no relaxation.
    pub fn run(&mut self) -> Result<DesignOutcome> {
        self.run_and_optimize(0)
    }

    /// Runs, then relaxes the gradient parameters up to `max_iterations`
    /// times while the engine keeps coming back empty.
    pub fn run_and_optimize(&mut self, max_iterations: usize) -> Result<DesignOutcome> {
        let snapshot = self.params.snapshot();
        let outcome = self.optimize(max_iterations);
        self.params.restore(snapshot);
        outcome
    }

    fn transition(&mut self, state: DesignState) {
        info!("design: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Returns the warnings raised along the way.
    fn resolve(&mut self) -> Result<Vec<String>> {
        let mut warnings = vec![];
        if self.params.bool_value(names::PRIMER_USE_OVERHANGS)? {
            resolve_overhangs(&mut self.params)?;
        } else {
            // before trimming, which writes the stash into the overhangs
            warnings = warn_ignored_overhangs(&self.params)?;
        }
        if self.params.bool_value(names::PRIMER_LONG_OK)? {
            resolve_long_primers(&mut self.params, self.options.hard_size_limit)?;
            adjust_product_sizes(&mut self.params)?;
        }
        Ok(warnings)
    }

    fn gradient(&self) -> Result<RelaxationGradient> {
        let gradient = match &self.options.gradient {
            Some(gradient) => gradient.clone(),
            None => RelaxationGradient::from_defaults(&self.params)?,
        };
        Ok(gradient.cap(names::PRIMER_MAX_SIZE, self.options.hard_size_limit as f64))
    }

    /// Appends `\tNAME=value` for every parameter the engine's message names.
    fn explain_runtime_error(&self, message: &str) -> String {
        let named: BTreeSet<String> = self
            .params
            .iter()
            .filter(|(name, _)| message.contains(name))
            .map(|(name, value)| format!("\t{name}={value}"))
            .collect();
        if named.is_empty() {
            return message.to_string();
        }
        format!(
            "{message}\n{}",
            named.into_iter().collect::<Vec<_>>().join("\n")
        )
    }

    fn runtime_error(&self, source: EngineError) -> DesignError {
        DesignError::EngineRuntime {
            message: self.explain_runtime_error(&source.to_string()),
            source,
        }
    }

    fn submit(&mut self) -> Result<DesignResults> {
        self.transition(DesignState::Submitted);
        let sequence = self.params.sequence_map();
        let globals = self.params.global_map();
        debug!(
            "submitting {} sequence and {} global tag(s)",
            sequence.len(),
            globals.len()
        );
        let flat = match self.engine.design(&sequence, &globals) {
            Ok(flat) => flat,
            Err(e) if self.options.quiet_runtime => {
                info!("engine failed, returning no results: {e}");
                return Ok(DesignResults::from_error(&e.to_string()));
            }
            Err(e) => return Err(self.runtime_error(e)),
        };
        let mut results = DesignResults::from_engine(&flat);
        reconcile(
            &mut results,
            self.params.str_value(names::SEQUENCE_LONG_OVERHANG)?,
            self.params.str_value(names::SEQUENCE_REVCOMP_LONG_OVERHANG)?,
            self.params.str_value(names::SEQUENCE_PRIMER_OVERHANG)?,
            self.params.str_value(names::SEQUENCE_PRIMER_REVCOMP_OVERHANG)?,
            self.params.bool_value(names::PRIMER_USE_OVERHANGS)?,
        );
        Ok(results)
    }

    fn optimize(&mut self, max_iterations: usize) -> Result<DesignOutcome> {
        self.transition(DesignState::Built);
        let warnings = self.resolve()?;
        self.transition(DesignState::Resolved);

        let mut results = self.submit()?;
        let mut attempts = 1;
        let mut relaxations = vec![];
        if results.is_empty() && max_iterations > 0 {
            let gradient = self.gradient()?;
            let mut i = 0;
            while i < max_iterations && results.is_empty() {
                i += 1;
                let update = gradient.next_update(&self.params)?;
                if update.is_empty() {
                    info!("Reached end of gradient.");
                    break;
                }
                info!("Updated: {}", describe_update(&update));
                self.transition(DesignState::Relaxed);
                self.params.update(update.clone())?;
                relaxations.push(update);
                results = self.submit()?;
                attempts += 1;
            }
        }

        let state = if results.is_empty() {
            DesignState::Failed
        } else {
            DesignState::Succeeded
        };
        self.transition(state);
        Ok(DesignOutcome {
            explain: results.explain(),
            results,
            state,
            attempts,
            relaxations,
            warnings,
        })
    }
}
