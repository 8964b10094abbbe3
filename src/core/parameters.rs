//! Build parameters
//!
//! A build description can declare parameters, each a small set of named
//! choices. Every choice carries an `overrides` tree that is deep-merged into
//! the description when that choice is selected. Values are resolved with
//! priority: CLI > default.
//!
//! ```yaml
//! parameters:
//!   BOARD:
//!     desc: "Target board"
//!     default: qemu
//!     qemu:
//!       overrides:
//!         variables: { ZEPHYR_BOARD: qemu_x86 }
//!     nrf:
//!       overrides:
//!         variables: { ZEPHYR_BOARD: nrf52840dk_nrf52840 }
//! ```

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

use crate::config::defaults::PARAMETERS_KEY;
use crate::error::ParameterError;

const DESC_KEY: &str = "desc";
const DEFAULT_KEY: &str = "default";
const OVERRIDES_KEY: &str = "overrides";

/// An overridable parameter declared by the build description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Parameter name, used as `--NAME` on the command line
    pub name: String,
    /// Help text
    pub desc: Option<String>,
    /// Choice used when nothing is given on the command line
    pub default: String,
    /// Allowed values, in declaration order
    pub choices: Vec<String>,
}

/// Parameter value source for resolution priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterSource {
    /// Value from CLI argument (highest priority)
    Cli,
    /// Default value from the parameter declaration
    Default,
}

/// Resolved parameter value with its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParameter {
    /// Parameter name
    pub name: String,
    /// Selected choice
    pub value: String,
    /// Where the value came from
    pub source: ParameterSource,
}

fn malformed(name: &str, reason: &str) -> ParameterError {
    ParameterError::MalformedOverride {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parameters_mapping(root: &Value) -> Result<Option<&Mapping>, ParameterError> {
    match root.get(PARAMETERS_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Mapping(m)) => Ok(Some(m)),
        Some(_) => Err(malformed(PARAMETERS_KEY, "expected a mapping")),
    }
}

/// Discover every parameter declared by the build description
pub fn get_possible_parameters(root: &Value) -> Result<Vec<Parameter>, ParameterError> {
    let Some(mapping) = parameters_mapping(root)? else {
        return Ok(Vec::new());
    };

    let mut parameters = Vec::with_capacity(mapping.len());
    for (key, body) in mapping {
        let name = scalar_to_string(key)
            .ok_or_else(|| malformed(PARAMETERS_KEY, "parameter names must be strings"))?;
        let body = body
            .as_mapping()
            .ok_or_else(|| malformed(&name, "expected a mapping of choices"))?;

        let desc = match body.get(DESC_KEY) {
            Some(v) => Some(
                scalar_to_string(v).ok_or_else(|| malformed(&name, "'desc' must be a string"))?,
            ),
            None => None,
        };

        let choices: Vec<String> = body
            .keys()
            .filter_map(scalar_to_string)
            .filter(|k| k != DESC_KEY && k != DEFAULT_KEY)
            .collect();
        if choices.is_empty() {
            return Err(ParameterError::NoChoices { name });
        }

        let default = body
            .get(DEFAULT_KEY)
            .and_then(scalar_to_string)
            .ok_or_else(|| malformed(&name, "missing 'default'"))?;
        if !choices.contains(&default) {
            return Err(ParameterError::InvalidDefault {
                name,
                default,
                choices,
            });
        }

        parameters.push(Parameter {
            name,
            desc,
            default,
            choices,
        });
    }
    Ok(parameters)
}

/// Resolve parameter values with priority: CLI > Default
///
/// # Arguments
/// * `parameters` - Declared parameters
/// * `cli_values` - Map of parameter name to value given on the command line
pub fn resolve_parameters(
    parameters: &[Parameter],
    cli_values: &HashMap<String, String>,
) -> Result<Vec<ResolvedParameter>, ParameterError> {
    let mut unknown: Vec<&String> = cli_values
        .keys()
        .filter(|name| !parameters.iter().any(|p| &p.name == *name))
        .collect();
    unknown.sort();
    if let Some(name) = unknown.first() {
        return Err(ParameterError::UnknownParameter {
            name: (*name).clone(),
            declared: parameters.iter().map(|p| p.name.clone()).collect(),
        });
    }

    parameters
        .iter()
        .map(|param| match cli_values.get(&param.name) {
            Some(value) if param.choices.contains(value) => Ok(ResolvedParameter {
                name: param.name.clone(),
                value: value.clone(),
                source: ParameterSource::Cli,
            }),
            Some(value) => Err(ParameterError::InvalidChoice {
                name: param.name.clone(),
                value: value.clone(),
                choices: param.choices.clone(),
            }),
            None => Ok(ResolvedParameter {
                name: param.name.clone(),
                value: param.default.clone(),
                source: ParameterSource::Default,
            }),
        })
        .collect()
}

/// Deep-merge `overlay` into `base`
///
/// Mappings merge recursively, sequences are appended, anything else is
/// replaced by the overlay value.
pub fn merge_nodes(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => merge_nodes(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (Value::Sequence(base_seq), Value::Sequence(overlay_seq)) => {
            base_seq.extend(overlay_seq.iter().cloned());
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Apply the chosen overrides to the build description
///
/// Parameters are applied in declaration order; the `parameters` section is
/// removed afterwards.
pub fn apply_parameters(
    root: &mut Value,
    resolved: &[ResolvedParameter],
) -> Result<(), ParameterError> {
    let mut overlays = Vec::with_capacity(resolved.len());
    if let Some(mapping) = parameters_mapping(root)? {
        for param in resolved {
            let choice = mapping
                .get(param.name.as_str())
                .and_then(|body| body.get(param.value.as_str()));
            let overrides = match choice.and_then(|c| c.get(OVERRIDES_KEY)) {
                None | Some(Value::Null) => continue,
                Some(o @ Value::Mapping(_)) => o.clone(),
                Some(_) => {
                    return Err(malformed(
                        &param.name,
                        &format!("'{}.{OVERRIDES_KEY}' must be a mapping", param.value),
                    ))
                }
            };
            tracing::debug!("Applying parameter {}={}", param.name, param.value);
            overlays.push(overrides);
        }
    }

    for overlay in &overlays {
        merge_nodes(root, overlay);
    }
    if let Value::Mapping(m) = root {
        m.remove(PARAMETERS_KEY);
    }
    Ok(())
}

/// Parse `--NAME VALUE` and `--NAME=VALUE` command line words
///
/// Only the syntax is checked here; names and values are validated by
/// [`resolve_parameters`]. A parameter given twice keeps its last value.
pub fn parse_override_args(args: &[String]) -> Result<HashMap<String, String>, ParameterError> {
    let invalid = |arg: &str, reason: &str| ParameterError::InvalidArgument {
        arg: arg.to_string(),
        reason: reason.to_string(),
    };

    let mut values = HashMap::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(flag) = arg.strip_prefix("--") else {
            return Err(invalid(arg, "expected --NAME VALUE"));
        };
        let (name, value) = match flag.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => {
                let value = iter
                    .next()
                    .filter(|v| !v.starts_with("--"))
                    .ok_or_else(|| invalid(arg, "missing value"))?;
                (flag.to_string(), value.clone())
            }
        };
        if name.is_empty() {
            return Err(invalid(arg, "empty parameter name"));
        }
        values.insert(name, value);
    }
    Ok(values)
}

/// Render parameter values back into command line words, sorted by name
pub fn override_words(values: &HashMap<String, String>) -> Vec<String> {
    let mut pairs: Vec<(&String, &String)> = values.iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .flat_map(|(name, value)| [format!("--{name}"), value.clone()])
        .collect()
}
