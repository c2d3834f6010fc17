//! Dynamically typed template variable values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Resolved variables, keyed by variable name
///
/// Ordered so metadata listings and reports are stable across runs.
pub type Variables = BTreeMap<String, Value>;

/// A single variable value as declared in a descriptor or supplied by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Boolean view of the value; only `Bool` counts
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Interpret a raw command-line value (`--var key=value`)
    ///
    /// `true`/`false` become booleans, integers and floats become numbers,
    /// anything else stays a string.
    pub fn parse_cli(raw: &str) -> Self {
        match raw {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
        Value::String(raw.to_string())
    }

    /// Name of the value's type, matching descriptor `type` names
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_values() {
        assert_eq!(Value::parse_cli("true"), Value::Bool(true));
        assert_eq!(Value::parse_cli("false"), Value::Bool(false));
        assert_eq!(Value::parse_cli("42"), Value::Int(42));
        assert_eq!(Value::parse_cli("3.5"), Value::Float(3.5));
        assert_eq!(Value::parse_cli("postgres"), Value::from("postgres"));
        assert_eq!(Value::parse_cli("True"), Value::from("True"));
    }

    #[test]
    fn test_untagged_yaml_values() {
        let vars: Variables =
            serde_yaml::from_str("a: true\nb: 3\nc: \"3.11\"\nd: sqlite\ne: 1.5\n").unwrap();
        assert_eq!(vars["a"], Value::Bool(true));
        assert_eq!(vars["b"], Value::Int(3));
        assert_eq!(vars["c"], Value::from("3.11"));
        assert_eq!(vars["d"], Value::from("sqlite"));
        assert_eq!(vars["e"], Value::Float(1.5));
    }

    #[test]
    fn test_list_and_map_values() {
        let vars: Variables =
            serde_yaml::from_str("tags: [api, web]
limits:
  cpu: 2
  memory: 512Mi
").unwrap();
        assert_eq!(
            vars["tags"],
            Value::List(vec![Value::from("api"), Value::from("web")])
        );
        assert_eq!(vars["limits"].type_name(), "map");
        assert_eq!(vars["limits"].to_string(), "{cpu: 2, memory: 512Mi}");
    }

    #[test]
    fn test_display_natural_representation() {
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::from("none").to_string(), "none");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::from("b")]).to_string(),
            "[1, b]"
        );
    }

    #[test]
    fn test_only_bool_coerces_to_bool() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::from("true").as_bool(), None);
        assert_eq!(Value::Int(1).as_bool(), None);
    }
}
