//! # Dataset Module
//!
//! Serializes telemetry datasets into comma-terminated text lines.
//!
//! Each [`Record`] becomes one line. A sequence record renders every element
//! followed by a comma; a scalar record renders its default text followed by
//! a comma.
//!
//! ```text
//! [[1.23456789, "x"], [42]]  ->  "1.23456789,x,\n42,\n"
//! ```

pub mod format;

use std::fmt;
use std::path::Path;

use tracing::error;

use crate::error::{HousekeepingError, Result};
use crate::indicator::{Rgb, StatusIndicator};
use crate::storage::Storage;
use format::{format_general, format_repr, DEFAULT_PRECISION, FLOAT_PRECISION};

/// A single dataset element
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Int(i64),
    Text(String),
}

/// One line of a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Scalar(Value),
    Sequence(Vec<Value>),
}

impl Value {
    /// Numeric rendering, if this value is a number
    ///
    /// Floats use 9 significant digits, integers the 6-digit `%G` form.
    pub fn render_numeric(&self) -> Option<String> {
        match self {
            Value::Float(v) => Some(format_general(*v, FLOAT_PRECISION, false)),
            Value::Int(v) => Some(format_general(*v as f64, DEFAULT_PRECISION, true)),
            Value::Text(_) => None,
        }
    }

    /// Numeric rendering, falling back to the default text
    pub fn render(&self) -> String {
        self.render_numeric().unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => f.write_str(&format_repr(*v)),
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Record {
    fn from(values: Vec<T>) -> Self {
        Record::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Record::Scalar(value)
    }
}

impl Record {
    /// Render the record as one newline-terminated line
    pub fn to_line(&self) -> String {
        let mut line = String::new();
        match self {
            Record::Sequence(values) => {
                for value in values {
                    line.push_str(&value.render());
                    line.push(',');
                }
            }
            Record::Scalar(value) => {
                line.push_str(&value.to_string());
                line.push(',');
            }
        }
        line.push('\n');
        line
    }
}

/// Append `dataset` to `target`, one line per record
///
/// Lines already written stay in place if a later write fails.
///
/// # Errors
///
/// Returns `Storage` if a line cannot be appended; the indicator is set to
/// red before returning.
pub fn save<S: Storage + ?Sized>(
    storage: &S,
    indicator: &dyn StatusIndicator,
    dataset: &[Record],
    target: &Path,
) -> Result<()> {
    // The target exists afterwards even for an empty dataset
    let written = storage.append(target, b"").and_then(|()| {
        dataset
            .iter()
            .try_for_each(|record| storage.append(target, record.to_line().as_bytes()))
    });

    written.map_err(|e| {
        error!("SD save to {} failed: {}", target.display(), e);
        indicator.set_rgb(Rgb::RED);
        HousekeepingError::storage("Failed to save to", target, e)
    })
}
