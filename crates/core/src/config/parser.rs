//! Command line, environment and config file parsing.
//!
//! Three layers are merged, lowest precedence first:
//! 1. Environment/defaults object (unknown keys dropped)
//! 2. JSON config file named by `config`
//! 3. Command line tokens (`--key=value` or `--key value`)
//!
//! Every merged value is then coerced to the type declared in
//! [`CONFIG_PARAMS`].

use super::params::{param_type, ParamTable, ParamType, CONFIG_PARAMS};
use crate::error::ConfigError;
use serde_json::{Map, Number, Value};
use std::path::Path;

/// Keys of `table` declared with type `kind`, in table order.
pub fn filter_type<'a>(table: &ParamTable<'a>, kind: ParamType) -> Vec<&'a str> {
    table
        .iter()
        .filter(|(_, declared)| *declared == kind)
        .map(|(key, _)| *key)
        .collect()
}

/// Rebuild a map from key/value pairs.
pub fn entries_to_obj<I, K>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Members of `obj` whose keys are declared in `table`.
pub fn filter_members(obj: &Map<String, Value>, table: &ParamTable<'_>) -> Map<String, Value> {
    entries_to_obj(
        obj.iter()
            .filter(|(key, _)| param_type(table, key).is_some())
            .map(|(key, value)| (key.clone(), value.clone())),
    )
}

/// Parse and merge server configuration from `argv` and `env`.
pub fn parse_server_config<S: AsRef<str>>(
    argv: &[S],
    env: &Map<String, Value>,
) -> Result<Map<String, Value>, ConfigError> {
    let cli = parse_args(argv)?;
    let mut merged = filter_members(env, CONFIG_PARAMS);

    let config_path = match cli.get("config").or_else(|| merged.get("config")) {
        Some(path) => Some(coerce("config", ParamType::String, path.clone())?),
        None => None,
    };
    if let Some(Value::String(path)) = config_path {
        merged.extend(read_config_file(&path)?);
    }
    merged.extend(cli);

    let coerced = merged
        .into_iter()
        .map(|(key, value)| {
            let kind = param_type(CONFIG_PARAMS, &key)
                .ok_or_else(|| ConfigError::UnexpectedParam(key.clone()))?;
            let value = coerce(&key, kind, value)?;
            Ok((key, value))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(entries_to_obj(coerced))
}

/// Tokenize command line arguments into raw string values.
fn parse_args<S: AsRef<str>>(argv: &[S]) -> Result<Map<String, Value>, ConfigError> {
    let mut parsed = Map::new();
    let tokens: Vec<&str> = argv.iter().map(|arg| arg.as_ref()).collect();
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        let Some(flag) = token.strip_prefix("--") else {
            return Err(ConfigError::UnexpectedParam(token.to_string()));
        };

        let (key, inline) = match flag.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (flag, None),
        };
        let kind = param_type(CONFIG_PARAMS, key)
            .ok_or_else(|| ConfigError::UnexpectedParam(key.to_string()))?;

        let value = match (inline, kind) {
            (Some(value), _) => value.to_string(),
            // a bare boolean flag is "true"; only an explicit true/false is consumed
            (None, ParamType::Boolean) => match tokens.peek() {
                Some(next) if *next == "true" || *next == "false" => {
                    tokens.next().unwrap_or("true").to_string()
                }
                _ => "true".to_string(),
            },
            (None, _) => match tokens.peek() {
                Some(next) if !next.starts_with("--") => tokens.next().unwrap_or("").to_string(),
                _ => return Err(ConfigError::MissingValue(key.to_string())),
            },
        };

        parsed.insert(key.to_string(), Value::String(value));
    }

    Ok(parsed)
}

/// Read a JSON config file, rejecting keys outside [`CONFIG_PARAMS`].
fn read_config_file(path: &str) -> Result<Map<String, Value>, ConfigError> {
    let content = std::fs::read_to_string(Path::new(path)).map_err(|source| {
        ConfigError::UnreadableConfigFile {
            path: path.to_string(),
            source,
        }
    })?;

    let value: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Syntax {
        path: path.to_string(),
        source,
    })?;
    let Value::Object(file) = value else {
        return Err(ConfigError::NotAnObject(path.to_string()));
    };

    if let Some(key) = file.keys().find(|key| param_type(CONFIG_PARAMS, key).is_none()) {
        return Err(ConfigError::UnexpectedParam(key.clone()));
    }

    Ok(file)
}

/// Coerce a raw value to its declared type.
fn coerce(key: &str, kind: ParamType, value: Value) -> Result<Value, ConfigError> {
    match kind {
        ParamType::Boolean => match value {
            Value::Bool(_) => Ok(value),
            Value::String(s) if s == "true" => Ok(Value::Bool(true)),
            Value::String(s) if s == "false" => Ok(Value::Bool(false)),
            _ => Err(ConfigError::InvalidBoolean(key.to_string())),
        },
        ParamType::Number => match value {
            Value::Number(_) => Ok(value),
            Value::String(s) => {
                parse_number(s.trim()).ok_or_else(|| ConfigError::InvalidNumber(key.to_string()))
            }
            _ => Err(ConfigError::InvalidNumber(key.to_string())),
        },
        ParamType::String => match value {
            Value::String(_) => Ok(value),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(ConfigError::InvalidString(key.to_string())),
        },
    }
}

/// Integers are kept exact; anything else must be a finite float.
fn parse_number(s: &str) -> Option<Value> {
    if let Ok(n) = s.parse::<u64>() {
        return Some(Value::from(n));
    }
    if let Ok(n) = s.parse::<i64>() {
        return Some(Value::from(n));
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
