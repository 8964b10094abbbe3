//! Variable expansion
//!
//! The top-level `variables` mapping defines `NAME: value` pairs that can be
//! referenced from any string in the build description as `%{NAME}`.
//! Variables may reference other variables; loops are rejected.

use regex::Regex;
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use crate::config::defaults::{ROOT_TARGET, VARIABLES_KEY};
use crate::core::config_value::ConfigValue;
use crate::error::ConfigError;

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"%\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("variable pattern is valid")
    })
}

/// Substitute `%{NAME}` references in `input` from `vars`
///
/// `key` is the dotted path of the string, used in error messages.
pub fn substitute(
    input: &str,
    vars: &HashMap<String, String>,
    key: &str,
) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut last_end = 0;

    for cap in variable_pattern().captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let name = &cap[1];
        let value = vars.get(name).ok_or_else(|| ConfigError::UnknownVariable {
            name: name.to_string(),
            key: key.to_string(),
        })?;

        output.push_str(&input[last_end..full_match.start()]);
        output.push_str(value);
        last_end = full_match.end();
    }

    output.push_str(&input[last_end..]);
    Ok(output)
}

/// Resolve every variable to its final value
pub fn resolve_variables(
    raw: &BTreeMap<String, String>,
) -> Result<HashMap<String, String>, ConfigError> {
    let mut resolved = HashMap::new();
    for name in raw.keys() {
        let mut stack = Vec::new();
        resolve_one(name, raw, &mut resolved, &mut stack)?;
    }
    Ok(resolved)
}

fn resolve_one(
    name: &str,
    raw: &BTreeMap<String, String>,
    resolved: &mut HashMap<String, String>,
    stack: &mut Vec<String>,
) -> Result<String, ConfigError> {
    if let Some(value) = resolved.get(name) {
        return Ok(value.clone());
    }
    if stack.iter().any(|s| s == name) {
        stack.push(name.to_string());
        return Err(ConfigError::VariableCycle {
            cycle: stack.clone(),
        });
    }

    let key = format!("{VARIABLES_KEY}.{name}");
    let template = raw.get(name).ok_or_else(|| ConfigError::UnknownVariable {
        name: name.to_string(),
        key: key.clone(),
    })?;

    stack.push(name.to_string());
    let mut deps = HashMap::new();
    for cap in variable_pattern().captures_iter(template) {
        let dep = &cap[1];
        if !raw.contains_key(dep) {
            return Err(ConfigError::UnknownVariable {
                name: dep.to_string(),
                key,
            });
        }
        let value = resolve_one(dep, raw, resolved, stack)?;
        deps.insert(dep.to_string(), value);
    }
    stack.pop();

    let value = substitute(template, &deps, &key)?;
    resolved.insert(name.to_string(), value.clone());
    Ok(value)
}

/// Read the `variables` mapping of the build description
fn read_variables(root: &Value) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut raw = BTreeMap::new();
    let Some(vars) = root.get(VARIABLES_KEY) else {
        return Ok(raw);
    };
    if vars.is_null() {
        return Ok(raw);
    }
    let mapping = vars.as_mapping().ok_or_else(|| ConfigError::InvalidType {
        target: ROOT_TARGET.to_string(),
        key: VARIABLES_KEY.to_string(),
        expected: "a mapping".to_string(),
    })?;
    for (key, value) in mapping {
        let name = key.as_str().ok_or_else(|| ConfigError::InvalidType {
            target: ROOT_TARGET.to_string(),
            key: VARIABLES_KEY.to_string(),
            expected: "a mapping with string keys".to_string(),
        })?;
        let path = format!("{VARIABLES_KEY}.{name}");
        let text = ConfigValue::new(value, ROOT_TARGET, path).as_str()?;
        raw.insert(name.to_string(), text);
    }
    Ok(raw)
}

/// Expand all `%{NAME}` references in the build description in place
pub fn expand_variables(root: &mut Value) -> Result<(), ConfigError> {
    let raw = read_variables(root)?;
    let resolved = resolve_variables(&raw)?;

    if let Some(Value::Mapping(vars)) = root.get_mut(VARIABLES_KEY) {
        for (key, value) in vars.iter_mut() {
            if let Some(resolved_value) = key.as_str().and_then(|k| resolved.get(k)) {
                *value = Value::String(resolved_value.clone());
            }
        }
    }

    if let Value::Mapping(mapping) = root {
        for (key, value) in mapping.iter_mut() {
            let name = key.as_str().unwrap_or_default();
            if name == VARIABLES_KEY {
                continue;
            }
            expand_in_value(value, &resolved, name)?;
        }
    }
    Ok(())
}

fn expand_in_value(
    value: &mut Value,
    vars: &HashMap<String, String>,
    path: &str,
) -> Result<(), ConfigError> {
    match value {
        Value::String(s) => {
            *s = substitute(s, vars, path)?;
        }
        Value::Sequence(seq) => {
            for (i, item) in seq.iter_mut().enumerate() {
                expand_in_value(item, vars, &format!("{path}[{i}]"))?;
            }
        }
        Value::Mapping(mapping) => {
            for (key, item) in mapping.iter_mut() {
                let child = format!("{path}.{}", key.as_str().unwrap_or("?"));
                expand_in_value(item, vars, &child)?;
            }
        }
        Value::Tagged(tagged) => expand_in_value(&mut tagged.value, vars, path)?,
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_replaces_known_variable() {
        let v = vars(&[("BOARD", "qemu_x86")]);
        assert_eq!(
            substitute("board-%{BOARD}-x", &v, "k").unwrap(),
            "board-qemu_x86-x"
        );
    }

    #[test]
    fn test_substitute_rejects_unknown_variable() {
        let err = substitute("%{NOPE}", &HashMap::new(), "targets.app.board").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownVariable {
                name: "NOPE".to_string(),
                key: "targets.app.board".to_string(),
            }
        );
    }

    #[test]
    fn test_substitute_leaves_other_syntax_alone() {
        let v = HashMap::new();
        assert_eq!(substitute("${HOME} %x $in", &v, "k").unwrap(), "${HOME} %x $in");
    }

    #[test]
    fn test_resolve_nested_variables() {
        let mut raw = BTreeMap::new();
        raw.insert("SDK".to_string(), "/opt/sdk".to_string());
        raw.insert("WEST".to_string(), "%{SDK}/bin/west".to_string());
        let resolved = resolve_variables(&raw).unwrap();
        assert_eq!(resolved["WEST"], "/opt/sdk/bin/west");
    }

    #[test]
    fn test_resolve_detects_cycle() {
        let mut raw = BTreeMap::new();
        raw.insert("A".to_string(), "%{B}".to_string());
        raw.insert("B".to_string(), "%{A}".to_string());
        match resolve_variables(&raw).unwrap_err() {
            ConfigError::VariableCycle { cycle } => {
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 3);
            }
            other => panic!("Expected VariableCycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_expand_variables_walks_whole_tree() {
        let mut root: Value = serde_yaml::from_str(
            r"
desc: demo
variables:
  BOARD: nrf52840dk_nrf52840
  OUT: build-%{BOARD}
targets:
  app:
    build-dir: '%{OUT}'
    builder:
      type: zephyr
      board: '%{BOARD}'
      target_images: ['%{OUT}/zephyr.elf']
",
        )
        .unwrap();
        expand_variables(&mut root).unwrap();
        let app = &root["targets"]["app"];
        assert_eq!(app["build-dir"], "build-nrf52840dk_nrf52840");
        assert_eq!(app["builder"]["board"], "nrf52840dk_nrf52840");
        assert_eq!(
            app["builder"]["target_images"][0],
            "build-nrf52840dk_nrf52840/zephyr.elf"
        );
        assert_eq!(root["variables"]["OUT"], "build-nrf52840dk_nrf52840");
    }

    #[test]
    fn test_expand_variables_without_variables_section() {
        let mut root: Value = serde_yaml::from_str("desc: x\ntargets: {}\n").unwrap();
        expand_variables(&mut root).unwrap();
        assert_eq!(root["desc"], "x");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: strings without `%{` are returned unchanged
        #[test]
        fn prop_plain_strings_unchanged(s in "[a-zA-Z0-9 _/.$-]{0,40}") {
            let out = substitute(&s, &HashMap::new(), "k").unwrap();
            prop_assert_eq!(out, s);
        }
    }
}
