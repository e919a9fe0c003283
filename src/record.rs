use std::{
    borrow::Cow,
    fmt::{self, Display},
};

/// Severity of an emitted request record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    #[default]
    Info,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a record attribute. Either a scalar or a named group of attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Group(Vec<Attr>),
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Group(attrs) => {
                f.write_str("[")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}={}", attr.key, attr.value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Key-value pair attached to a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: Cow<'static, str>,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Attr {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Attr::new(key, Value::Str(value.into()))
    }

    pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Attr::new(key, Value::Int(value))
    }

    pub fn group(key: impl Into<Cow<'static, str>>, attrs: Vec<Attr>) -> Self {
        Attr::new(key, Value::Group(attrs))
    }
}

/// One structured log emission for a completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub level: Level,
    pub message: &'static str,
    pub attrs: Vec<Attr>,
}

impl Record {
    /// Flattens groups into dotted keys, keeping insertion order.
    ///
    /// `request` group with `method` becomes `request.method`, and so on.
    pub fn flatten(&self) -> Vec<(String, &Value)> {
        let mut out = Vec::with_capacity(self.attrs.len() + 4);
        flatten_into(&mut out, None, &self.attrs);
        out
    }
}

fn flatten_into<'a>(out: &mut Vec<(String, &'a Value)>, prefix: Option<&str>, attrs: &'a [Attr]) {
    for attr in attrs {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{}", attr.key),
            None => attr.key.to_string(),
        };
        match &attr.value {
            Value::Group(inner) => flatten_into(out, Some(key.as_str()), inner),
            value => out.push((key, value)),
        }
    }
}

/// Renders the record as a single `key=value` line:
/// `level=INFO msg=REQUEST request.method=GET request.uri=/ response.status=200`.
impl Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level={} msg=", self.level)?;
        write_text(f, self.message)?;
        for (key, value) in self.flatten() {
            write!(f, " {key}=")?;
            match value {
                Value::Str(s) => write_text(f, s)?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '=' || c.is_control())
}

fn write_text(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if needs_quoting(s) {
        write!(f, "{s:?}")
    } else {
        f.write_str(s)
    }
}
