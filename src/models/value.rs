use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 单元格值 (one scalar cell of an uploaded table)
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

/// Result of reading a cell in a numeric role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Number(f64),
    Missing,
    NotANumber,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Empty cells and NaN floats both count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Booleans take part in arithmetic as 0/1, text never does.
    pub fn numeric(&self) -> Numeric {
        match self {
            Value::Empty => Numeric::Missing,
            Value::Int(i) => Numeric::Number(*i as f64),
            Value::Float(f) if f.is_nan() => Numeric::Missing,
            Value::Float(f) => Numeric::Number(*f),
            Value::Bool(b) => Numeric::Number(if *b { 1.0 } else { 0.0 }),
            Value::Text(_) => Numeric::NotANumber,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.numeric() {
            Numeric::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Grouping / sorting key. Missing values have no key and drop out of groupings.
    pub fn key(&self) -> Option<CellKey> {
        match self {
            Value::Empty => None,
            Value::Float(f) if f.is_nan() => None,
            Value::Int(i) => Some(CellKey::Number(NumberKey(*i as f64))),
            Value::Float(f) => Some(CellKey::Number(NumberKey(*f))),
            Value::Text(s) => Some(CellKey::Text(s.clone())),
            Value::Bool(b) => Some(CellKey::Bool(*b)),
        }
    }
}

/// Python-style string form: integral floats keep a trailing `.0`, booleans are
/// `True`/`False`, missing values print as empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) if v.is_nan() => f.write_str("nan"),
            Value::Float(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "inf" } else { "-inf" })
            }
            Value::Float(v) if v.fract() == 0.0 && v.abs() < 1e16 => write!(f, "{:.1}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Empty => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(_) => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Totally ordered float so numeric cells can key maps. Ints and floats share it,
/// so `5` and `5.0` land in the same group.
#[derive(Debug, Clone, Copy)]
pub struct NumberKey(pub f64);

impl NumberKey {
    fn normalized(self) -> f64 {
        // -0.0 and 0.0 compare equal
        if self.0 == 0.0 {
            0.0
        } else {
            self.0
        }
    }
}

impl PartialEq for NumberKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumberKey {}

impl PartialOrd for NumberKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumberKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized().total_cmp(&other.normalized())
    }
}

impl Hash for NumberKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().to_bits().hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellKey {
    Bool(bool),
    Number(NumberKey),
    Text(String),
}

/// Ascending order with missing values last.
pub fn cmp_missing_last(a: &Value, b: &Value) -> Ordering {
    match (a.key(), b.key()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
