//! Typed read-only access to the parsed build description
//!
//! [`ConfigValue`] wraps a node of the YAML tree together with its dotted
//! path and the name of the target it belongs to, so every lookup failure
//! can say exactly which key of which target is wrong.

use serde_yaml::Value;

use crate::error::ConfigError;

/// A node of the build description
#[derive(Debug, Clone)]
pub struct ConfigValue<'a> {
    value: &'a Value,
    target: &'a str,
    path: String,
}

impl<'a> ConfigValue<'a> {
    /// Wrap `value`, attributing errors to `target` at `path`
    pub fn new(value: &'a Value, target: &'a str, path: impl Into<String>) -> Self {
        Self {
            value,
            target,
            path: path.into(),
        }
    }

    /// Dotted path of this node
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Target this node belongs to
    pub fn target(&self) -> &'a str {
        self.target
    }

    /// Raw YAML value
    pub fn raw(&self) -> &'a Value {
        self.value
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    fn invalid(&self, expected: &str) -> ConfigError {
        ConfigError::InvalidType {
            target: self.target.to_string(),
            key: self.path.clone(),
            expected: expected.to_string(),
        }
    }

    /// Look up a required key
    pub fn get(&self, key: &str) -> Result<ConfigValue<'a>, ConfigError> {
        self.get_opt(key).ok_or_else(|| ConfigError::MissingKey {
            target: self.target.to_string(),
            key: self.child_path(key),
        })
    }

    /// Look up an optional key; explicit `null` counts as absent
    pub fn get_opt(&self, key: &str) -> Option<ConfigValue<'a>> {
        self.value
            .get(key)
            .filter(|v| !v.is_null())
            .map(|value| ConfigValue {
                value,
                target: self.target,
                path: self.child_path(key),
            })
    }

    /// Read a string scalar
    ///
    /// Numbers and booleans are accepted and rendered, so `board: 52840`
    /// reads as `"52840"`.
    pub fn as_str(&self) -> Result<String, ConfigError> {
        match self.value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(self.invalid("a string")),
        }
    }

    /// Read a sequence
    pub fn as_list(&self) -> Result<Vec<ConfigValue<'a>>, ConfigError> {
        let seq = self
            .value
            .as_sequence()
            .ok_or_else(|| self.invalid("a list"))?;
        Ok(seq
            .iter()
            .enumerate()
            .map(|(i, value)| ConfigValue {
                value,
                target: self.target,
                path: format!("{}[{i}]", self.path),
            })
            .collect())
    }

    /// Read a sequence of string scalars
    pub fn as_str_list(&self) -> Result<Vec<String>, ConfigError> {
        self.as_list()?.iter().map(ConfigValue::as_str).collect()
    }

    /// Read a sequence of string scalars holding at least one element
    pub fn as_non_empty_str_list(&self) -> Result<Vec<String>, ConfigError> {
        let list = self.as_str_list()?;
        if list.is_empty() {
            return Err(self.invalid("a non-empty list of strings"));
        }
        Ok(list)
    }

    /// Read either a single string or a list of strings
    pub fn as_str_or_list(&self) -> Result<Vec<String>, ConfigError> {
        if self.value.is_sequence() {
            self.as_str_list()
        } else {
            Ok(vec![self.as_str()?])
        }
    }
}
