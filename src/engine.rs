//! The engine call boundary.
//!
//! The design engine is opaque: it takes the cleaned SEQUENCE and GLOBAL
//! parameter maps and answers with one flat `KEY -> value` map. The
//! [`Primer3Core`] implementation drives the native `primer3_core` binary
//! over BoulderIO.

use crate::boulder::{decode_records, encode_record};
use crate::params::{ParamMap, ParamValue};
use log::debug;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fmt,
    io::{ErrorKind, Write},
    process::{Command, Output, Stdio},
};

const DEFAULT_PRIMER3_BIN: &str = "primer3_core";
const PRIMER3_ENV_BIN: &str = "PRIMER3_CORE_BIN";
const PRIMER3_ENV_THERMO: &str = "PRIMER3_THERMO_PARAMS";
const THERMO_PATH_TAG: &str = "PRIMER_THERMODYNAMIC_PARAMETERS_PATH";

pub type EngineOutput = BTreeMap<String, Value>;

#[derive(Debug, Clone)]
pub enum EngineError {
    ToolNotFound {
        executable: String,
    },
    ToolFailed {
        executable: String,
        args: Vec<String>,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },
    Io {
        message: String,
    },
    /// The engine ran but refused the input (`PRIMER_ERROR`).
    Reported {
        message: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolNotFound { executable } => write!(
                f,
                "Could not find primer3 executable '{}'. Install primer3 or set {}",
                executable, PRIMER3_ENV_BIN
            ),
            Self::ToolFailed {
                executable,
                args,
                status,
                stdout,
                stderr,
            } => write!(
                f,
                "primer3 command failed: {} {} (status={:?}, stdout='{}', stderr='{}')",
                executable,
                args.join(" "),
                status,
                stdout.trim(),
                stderr.trim()
            ),
            Self::Io { message } => write!(f, "{message}"),
            Self::Reported { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for EngineError {}

pub trait DesignEngine {
    fn design(&self, sequence: &ParamMap, globals: &ParamMap) -> Result<EngineOutput, EngineError>;
}

impl<E: DesignEngine + ?Sized> DesignEngine for &E {
    fn design(&self, sequence: &ParamMap, globals: &ParamMap) -> Result<EngineOutput, EngineError> {
        (**self).design(sequence, globals)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primer3Core {
    executable: String,
    args: Vec<String>,
    thermo_params: Option<String>,
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for Primer3Core {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Primer3Core {
    /// Executable from `PRIMER3_CORE_BIN` (falls back to `primer3_core` on
    /// `PATH`), thermodynamic parameter directory from `PRIMER3_THERMO_PARAMS`.
    pub fn from_env() -> Self {
        Self {
            executable: env_non_empty(PRIMER3_ENV_BIN)
                .unwrap_or_else(|| DEFAULT_PRIMER3_BIN.to_string()),
            args: vec![],
            thermo_params: env_non_empty(PRIMER3_ENV_THERMO),
        }
    }

    pub fn with_executable(executable: &str) -> Self {
        Self {
            executable: executable.to_string(),
            args: vec![],
            thermo_params: None,
        }
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_thermo_params(mut self, path: &str) -> Self {
        self.thermo_params = Some(path.to_string());
        self
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    fn run(&self, input: &str) -> Result<Output, EngineError> {
        let mut child = Command::new(&self.executable)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    EngineError::ToolNotFound {
                        executable: self.executable.clone(),
                    }
                } else {
                    EngineError::Io {
                        message: format!(
                            "Could not run primer3 executable '{}': {}",
                            self.executable, e
                        ),
                    }
                }
            })?;
        let io_error = |e: std::io::Error| EngineError::Io {
            message: format!("Could not talk to primer3 executable '{}': {}", self.executable, e),
        };
        match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(input.as_bytes()).map_err(io_error)?,
            None => {
                return Err(EngineError::Io {
                    message: "primer3 stdin was not captured".to_string(),
                });
            }
        }
        child.wait_with_output().map_err(io_error)
    }
}

impl DesignEngine for Primer3Core {
    fn design(&self, sequence: &ParamMap, globals: &ParamMap) -> Result<EngineOutput, EngineError> {
        let mut globals = globals.clone();
        if let Some(path) = &self.thermo_params {
            globals
                .entry(THERMO_PATH_TAG.to_string())
                .or_insert_with(|| ParamValue::Str(path.clone()));
        }
        let input = encode_record(&[sequence, &globals]);
        debug!(
            "primer3: {} {} ({} input tags)",
            self.executable,
            self.args.join(" "),
            sequence.len() + globals.len()
        );
        let output = self.run(&input)?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            return Err(EngineError::ToolFailed {
                executable: self.executable.clone(),
                args: self.args.clone(),
                status: output.status.code(),
                stdout,
                stderr,
            });
        }
        let result = decode_records(&stdout).into_iter().next().unwrap_or_default();
        if let Some(message) = result.get("PRIMER_ERROR") {
            let message = match message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(EngineError::Reported { message });
        }
        debug!("primer3: {} output tags", result.len());
        Ok(result)
    }
}
