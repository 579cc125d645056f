//! Canonical run input and the payload builder.

use crate::error_code::codes;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical request payload: positional and named arguments plus per-call overrides.
///
/// Both collections are always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunInput {
    pub input_args: Vec<Value>,
    pub input_kwargs: Map<String, Value>,
    /// Overrides the client timeout when set and non-zero.
    pub timeout_seconds: Option<u64>,
    /// Overrides the client `async_execution` default when set.
    pub async_execution: Option<bool>,
}

impl RunInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.input_args.push(value.into());
        self
    }

    /// Set one named argument (last write wins).
    pub fn kw(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.input_kwargs.insert(key.into(), value.into());
        self
    }

    pub fn timeout_seconds(mut self, secs: u64) -> Self {
        self.timeout_seconds = Some(secs);
        self
    }

    pub fn async_execution(mut self, enable: bool) -> Self {
        self.async_execution = Some(enable);
        self
    }

    /// Reduce a heterogeneous list of caller tokens into one input.
    ///
    /// ```rust
    /// use runagent::types::input::{arg, args, kw, kws, RunInput};
    /// use serde_json::json;
    ///
    /// let input = RunInput::from_tokens([
    ///     args(["q", "r"]),
    ///     arg(4),
    ///     kw("m", 3),
    ///     kws([("n", json!(1)), ("m", json!(9))]),
    /// ])
    /// .unwrap();
    /// assert_eq!(input.input_args, vec![json!("q"), json!("r"), json!(4)]);
    /// assert_eq!(input.input_kwargs["m"], json!(9));
    /// ```
    pub fn from_tokens<I>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = ArgToken>,
    {
        let mut input = Self::default();
        for token in tokens {
            match token {
                ArgToken::Arg(v) => input.input_args.push(v),
                ArgToken::Args(vs) => input.input_args.extend(vs),
                ArgToken::Kw(k, v) => {
                    input.input_kwargs.insert(k, v);
                }
                ArgToken::Kws(map) => input.input_kwargs.extend(map),
                ArgToken::Value(Value::Object(map)) => input.input_kwargs.extend(map),
                ArgToken::Value(Value::Array(_)) => {
                    return Err(Error::validation(
                        "pass positional sequences via args(...), not as a bare array",
                    )
                    .with_code(codes::INVALID_ARGUMENTS)
                    .with_suggestion("Use args([v1, v2, ...]) for many positional arguments, or arg(json!([...])) for one list argument"));
                }
                ArgToken::Value(v) => input.input_args.push(v),
            }
        }
        Ok(input)
    }

    /// Build the wire request, filling unset overrides from client defaults.
    pub fn into_request(
        self,
        entrypoint_tag: &str,
        default_timeout_secs: u64,
        default_async: bool,
    ) -> RunRequest {
        RunRequest {
            entrypoint_tag: entrypoint_tag.to_string(),
            input_args: self.input_args,
            input_kwargs: self.input_kwargs,
            timeout_seconds: self
                .timeout_seconds
                .filter(|t| *t > 0)
                .unwrap_or(default_timeout_secs),
            async_execution: self.async_execution.unwrap_or(default_async),
        }
    }
}

/// One caller-supplied argument token.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgToken {
    /// One positional value (may itself be a list).
    Arg(Value),
    /// Many positional values, appended in order.
    Args(Vec<Value>),
    /// One named value.
    Kw(String, Value),
    /// Many named values; colliding keys overwrite earlier ones.
    Kws(Map<String, Value>),
    /// A bare value: objects become named arguments, arrays are rejected,
    /// anything else becomes one positional argument.
    Value(Value),
}

pub fn arg(value: impl Into<Value>) -> ArgToken {
    ArgToken::Arg(value.into())
}

pub fn args<I, V>(values: I) -> ArgToken
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    ArgToken::Args(values.into_iter().map(Into::into).collect())
}

pub fn kw(key: impl Into<String>, value: impl Into<Value>) -> ArgToken {
    ArgToken::Kw(key.into(), value.into())
}

pub fn kws<I, K, V>(pairs: I) -> ArgToken
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    ArgToken::Kws(
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

/// Decompose a structured record into named arguments via its serde field names.
pub fn record<T: Serialize>(value: &T) -> Result<ArgToken> {
    let v = serde_json::to_value(value).map_err(|e| {
        Error::validation("failed to encode record into named arguments")
            .with_code(codes::INVALID_ARGUMENTS)
            .with_source(e)
    })?;
    Ok(ArgToken::Value(v))
}

impl From<Value> for ArgToken {
    fn from(v: Value) -> Self {
        ArgToken::Value(v)
    }
}

impl From<&str> for ArgToken {
    fn from(v: &str) -> Self {
        ArgToken::Value(Value::from(v))
    }
}

impl From<String> for ArgToken {
    fn from(v: String) -> Self {
        ArgToken::Value(Value::from(v))
    }
}

impl From<i64> for ArgToken {
    fn from(v: i64) -> Self {
        ArgToken::Value(Value::from(v))
    }
}

impl From<f64> for ArgToken {
    fn from(v: f64) -> Self {
        ArgToken::Value(Value::from(v))
    }
}

impl From<bool> for ArgToken {
    fn from(v: bool) -> Self {
        ArgToken::Value(Value::from(v))
    }
}

/// Request body shared by the synchronous call and the stream handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub entrypoint_tag: String,
    pub input_args: Vec<Value>,
    pub input_kwargs: Map<String, Value>,
    pub timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub async_execution: bool,
}
