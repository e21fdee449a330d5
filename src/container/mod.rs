//! Storage backends.
//!
//! A [`Container`] is the raw netCDF-style store a [`Dataset`](crate::Dataset)
//! sits on: named dimensions, named N-D variables over those dimensions and
//! attributes at global or variable scope. Backends only store and fetch; the
//! checks callers rely on (duplicates, unknown dimensions, read-only mode,
//! buffer lengths) are performed by `Dataset`.

use std::fmt;

use crate::{Error, Result};

mod memory;
#[cfg(feature = "mysofa")]
mod mysofa;

pub use memory::MemoryContainer;
#[cfg(feature = "mysofa")]
pub use mysofa::SofaFile;

/// Default fill value of netCDF double variables.
pub const NC_FILL_DOUBLE: f64 = 9.969_209_968_386_869e36;

/// Owner of an attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope<'a> {
    Global,
    Variable(&'a str),
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("dataset"),
            Scope::Variable(name) => write!(f, "variable `{name}`"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementType {
    Double,
    /// Values are rounded through `f32` when written.
    Float,
}

/// Attribute payload as stored by netCDF.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    /// `NC_CHAR` data, normally UTF-8 text.
    Char(Vec<u8>),
    Double(Vec<f64>),
    Int(Vec<i64>),
}

impl AttributeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Char(_) => "string",
            AttributeValue::Double(_) => "double",
            AttributeValue::Int(_) => "int",
        }
    }

    /// Decode a char attribute as text, trailing NULs stripped.
    ///
    /// Returns `None` for numeric attributes and for bytes that are not
    /// valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Char(bytes) => std::str::from_utf8(bytes)
                .ok()
                .map(|s| s.trim_end_matches('\0')),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Char(value.as_bytes().to_vec())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Char(value.into_bytes())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(vec![value])
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(vec![value])
    }
}

/// Contract of the storage engine underneath a SOFA dataset.
pub trait Container {
    fn is_writable(&self) -> bool;

    fn dimension(&self, name: &str) -> Option<usize>;

    fn add_dimension(&mut self, name: &str, size: usize) -> Result<()>;

    /// Ordered dimension names of a variable, `None` if it does not exist.
    fn variable_dimensions(&self, name: &str) -> Option<Vec<String>>;

    fn add_variable(&mut self, name: &str, element_type: ElementType, dims: &[&str])
        -> Result<()>;

    fn attribute(&self, scope: Scope<'_>, key: &str) -> Option<AttributeValue>;

    fn put_attribute(&mut self, scope: Scope<'_>, key: &str, value: AttributeValue)
        -> Result<()>;

    /// All values of a variable in row-major order.
    fn read_values(&self, name: &str) -> Result<Vec<f64>>;

    /// Write `values` starting at flat element index `start`.
    fn write_values(&mut self, name: &str, start: usize, values: &[f64]) -> Result<()>;

    /// Value reported for elements never written, `None` for zeros.
    fn set_fill(&mut self, name: &str, fill: Option<f64>) -> Result<()>;
}

fn missing_variable(name: &str) -> Error {
    Error::VariableNotFound(name.to_owned())
}
