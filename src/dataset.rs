//! Checked access to a [`Container`]: attributes, dimensions and variables.

use crate::container::{AttributeValue, Container, ElementType, MemoryContainer, Scope};
use crate::{Error, Result};

/// A named dimension and its size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub size: usize,
}

/// Handle to a declared variable.
///
/// A variable's shape is fixed at declaration, so the handle carries its
/// ordered dimensions by value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    name: String,
    dimensions: Vec<Dimension>,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|dim| dim.size).collect()
    }

    /// Number of elements, the product of all dimension sizes.
    pub fn len(&self) -> usize {
        self.dimensions.iter().map(|dim| dim.size).product()
    }

    /// Exact comparison of the declared sizes, in order.
    pub fn has_dimensions(&self, expected: &[usize]) -> bool {
        self.dimensions.len() == expected.len()
            && self
                .dimensions
                .iter()
                .zip(expected)
                .all(|(dim, size)| dim.size == *size)
    }
}

/// Fill behaviour for elements that are never written.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fill {
    Disabled,
    Value(f64),
}

/// A SOFA dataset on top of a storage container.
#[derive(Debug)]
pub struct Dataset<C = MemoryContainer> {
    container: C,
}

impl Dataset<MemoryContainer> {
    /// Empty in-memory dataset opened for creation.
    pub fn in_memory() -> Self {
        Dataset::new(MemoryContainer::new())
    }
}

impl<C: Container> Dataset<C> {
    pub fn new(container: C) -> Self {
        Dataset { container }
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn into_inner(self) -> C {
        self.container
    }

    pub fn is_writable(&self) -> bool {
        self.container.is_writable()
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.container.is_writable() {
            true => Ok(()),
            false => Err(Error::ReadOnly),
        }
    }

    pub fn has_attribute(&self, scope: Scope<'_>, key: &str) -> bool {
        self.container.attribute(scope, key).is_some()
    }

    pub fn attribute(&self, scope: Scope<'_>, key: &str) -> Result<AttributeValue> {
        self.container
            .attribute(scope, key)
            .ok_or_else(|| Error::AttributeNotFound {
                scope: scope.to_string(),
                key: key.to_owned(),
            })
    }

    /// Read an attribute that must be stored as text.
    pub fn attribute_as_string(&self, scope: Scope<'_>, key: &str) -> Result<String> {
        let value = self.attribute(scope, key)?;
        log::trace!("Reading attribute `{key}` on {scope} ({})", value.type_name());

        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| Error::TypeMismatch {
                scope: scope.to_string(),
                key: key.to_owned(),
                expected: "string",
            })
    }

    /// Read a global attribute. SOFA stores every global attribute as text,
    /// numeric-looking ones included.
    pub fn global_attribute_as_string(&self, key: &str) -> Result<String> {
        self.attribute_as_string(Scope::Global, key)
    }

    pub fn put_attribute<V>(&mut self, scope: Scope<'_>, key: &str, value: V) -> Result<()>
    where
        V: Into<AttributeValue>,
    {
        self.ensure_writable()?;

        if let Scope::Variable(name) = scope {
            if self.container.variable_dimensions(name).is_none() {
                return Err(Error::VariableNotFound(name.to_owned()));
            }
        }

        log::trace!("Writing attribute `{key}` on {scope}");
        self.container.put_attribute(scope, key, value.into())
    }

    /// Size of a dimension, `None` when it is not declared.
    pub fn dimension(&self, name: &str) -> Option<usize> {
        self.container.dimension(name)
    }

    pub fn add_dimension(&mut self, name: &str, size: usize) -> Result<()> {
        self.ensure_writable()?;

        if self.container.dimension(name).is_some() {
            return Err(Error::AlreadyExists(name.to_owned()));
        }

        log::trace!("Declaring dimension `{name}` = {size}");
        self.container.add_dimension(name, size)
    }

    /// Look up a variable, `None` when it is not declared.
    pub fn variable(&self, name: &str) -> Option<Variable> {
        let names = self.container.variable_dimensions(name)?;
        let dimensions = names
            .into_iter()
            .map(|dim| {
                let size = self.container.dimension(&dim)?;
                Some(Dimension { name: dim, size })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Variable {
            name: name.to_owned(),
            dimensions,
        })
    }

    pub fn require_variable(&self, name: &str) -> Result<Variable> {
        self.variable(name)
            .ok_or_else(|| Error::VariableNotFound(name.to_owned()))
    }

    pub fn add_variable(
        &mut self,
        name: &str,
        element_type: ElementType,
        dims: &[&str],
    ) -> Result<Variable> {
        self.ensure_writable()?;

        if self.container.variable_dimensions(name).is_some() {
            return Err(Error::AlreadyExists(name.to_owned()));
        }

        let dimensions = dims
            .iter()
            .map(|dim| {
                self.container
                    .dimension(dim)
                    .map(|size| Dimension {
                        name: (*dim).to_owned(),
                        size,
                    })
                    .ok_or_else(|| Error::DimensionNotFound((*dim).to_owned()))
            })
            .collect::<Result<Vec<_>>>()?;

        log::trace!("Declaring variable `{name}` {dims:?}");
        self.container.add_variable(name, element_type, dims)?;

        Ok(Variable {
            name: name.to_owned(),
            dimensions,
        })
    }

    pub fn set_fill(&mut self, variable: &Variable, fill: Fill) -> Result<()> {
        self.ensure_writable()?;

        let fill = match fill {
            Fill::Disabled => None,
            Fill::Value(value) => Some(value),
        };

        self.container.set_fill(&variable.name, fill)
    }

    /// Write the whole variable at once. `values` must hold exactly one
    /// element per cell of the declared shape.
    pub fn put_values(&mut self, variable: &Variable, values: &[f64]) -> Result<()> {
        self.ensure_writable()?;

        if values.len() != variable.len() {
            return Err(Error::LengthMismatch {
                variable: variable.name.clone(),
                expected: variable.len(),
                found: values.len(),
            });
        }

        self.container.write_values(&variable.name, 0, values)
    }

    /// Write `values` starting at flat element index `start`, leaving the
    /// rest of the variable untouched.
    pub fn put_values_at(
        &mut self,
        variable: &Variable,
        start: usize,
        values: &[f64],
    ) -> Result<()> {
        self.ensure_writable()?;

        let len = variable.len();
        let end = start.checked_add(values.len()).filter(|end| *end <= len);
        if end.is_none() {
            return Err(Error::LengthMismatch {
                variable: variable.name.clone(),
                expected: len,
                found: start.saturating_add(values.len()),
            });
        }

        self.container.write_values(&variable.name, start, values)
    }

    pub fn values(&self, variable: &Variable) -> Result<Vec<f64>> {
        let values = self.container.read_values(&variable.name)?;

        if values.len() != variable.len() {
            return Err(Error::LengthMismatch {
                variable: variable.name.clone(),
                expected: variable.len(),
                found: values.len(),
            });
        }

        Ok(values)
    }

    /// Read variable `name` into `buf`.
    ///
    /// `dims` is the shape the caller sized `buf` for. It must equal the
    /// declared shape and `buf` must be able to hold every element.
    pub fn get_values(&self, buf: &mut [f64], dims: &[usize], name: &str) -> Result<()> {
        let variable = self.require_variable(name)?;

        if !variable.has_dimensions(dims) {
            return Err(Error::ShapeMismatch {
                found: variable.shape(),
                variable: variable.name,
                expected: format!("{dims:?}"),
            });
        }

        let len = variable.len();
        if buf.len() < len {
            return Err(Error::LengthMismatch {
                variable: variable.name,
                expected: len,
                found: buf.len(),
            });
        }

        let values = self.values(&variable)?;
        buf[..values.len()].copy_from_slice(&values);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let mut dataset = Dataset::in_memory();
        for (name, size) in [("I", 1), ("C", 3), ("M", 1), ("R", 4), ("E", 8), ("N", 512)] {
            dataset.add_dimension(name, size).unwrap();
        }
        dataset
    }

    #[test]
    fn duplicate_dimension() {
        let mut dataset = dataset();
        assert!(matches!(
            dataset.add_dimension("M", 2),
            Err(Error::AlreadyExists(name)) if name == "M"
        ));
        assert_eq!(dataset.dimension("M"), Some(1));
        assert_eq!(dataset.dimension("Q"), None);
    }

    #[test]
    fn variable_over_unknown_dimension() {
        let mut dataset = dataset();
        let err = dataset
            .add_variable("ReceiverPosition", ElementType::Double, &["R", "C", "X"])
            .unwrap_err();
        assert!(matches!(err, Error::DimensionNotFound(name) if name == "X"));
        assert!(dataset.variable("ReceiverPosition").is_none());
    }

    #[test]
    fn data_ir_round_trip() {
        let mut dataset = dataset();
        let ir = dataset
            .add_variable("Data.IR", ElementType::Double, &["M", "R", "E", "N"])
            .unwrap();
        assert_eq!(ir.shape(), vec![1, 4, 8, 512]);

        let values = (0..ir.len()).map(|i| i as f64 * 0.25 - 100.0).collect::<Vec<_>>();
        dataset.put_values(&ir, &values).unwrap();

        let mut buf = vec![0.0; 4 * 8 * 512];
        dataset.get_values(&mut buf, &[1, 4, 8, 512], "Data.IR").unwrap();
        assert_eq!(buf, values);
    }

    #[test]
    fn put_values_checks_length() {
        let mut dataset = dataset();
        let pos = dataset
            .add_variable("ListenerPosition", ElementType::Double, &["I", "C"])
            .unwrap();

        let err = dataset.put_values(&pos, &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 3, found: 2, .. }));
    }

    #[test]
    fn get_values_checks_shape() {
        let mut dataset = dataset();
        dataset
            .add_variable("Data.Delay", ElementType::Double, &["I", "R", "E"])
            .unwrap();

        let mut buf = vec![0.0; 64];
        let err = dataset.get_values(&mut buf, &[1, 8, 4], "Data.Delay").unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { found, .. } if found == vec![1, 4, 8]));

        let mut small = vec![0.0; 16];
        let err = dataset.get_values(&mut small, &[1, 4, 8], "Data.Delay").unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 32, found: 16, .. }));
    }

    #[test]
    fn partial_writes_keep_fill() {
        let mut dataset = dataset();
        let up = dataset
            .add_variable("ListenerUp", ElementType::Double, &["I", "C"])
            .unwrap();
        dataset.set_fill(&up, Fill::Value(0.0)).unwrap();
        dataset.put_values_at(&up, 2, &[1.0]).unwrap();
        assert_eq!(dataset.values(&up).unwrap(), vec![0.0, 0.0, 1.0]);

        assert!(dataset.put_values_at(&up, 2, &[1.0, 1.0]).is_err());
    }

    #[test]
    fn write_past_end_is_length_mismatch() {
        let mut dataset = dataset();
        let up = dataset
            .add_variable("ListenerUp", ElementType::Double, &["I", "C"])
            .unwrap();

        assert!(matches!(
            dataset.put_values_at(&up, usize::MAX, &[1.0]),
            Err(Error::LengthMismatch { expected: 3, found: usize::MAX, .. })
        ));
        assert!(matches!(
            dataset.put_values_at(&up, 4, &[]),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_variable() {
        let mut dataset = dataset();
        dataset
            .add_variable("Data.IR", ElementType::Double, &["M", "R", "E", "N"])
            .unwrap();

        assert!(matches!(
            dataset.add_variable("Data.IR", ElementType::Float, &["M", "R"]),
            Err(Error::AlreadyExists(name)) if name == "Data.IR"
        ));
        assert_eq!(
            dataset.require_variable("Data.IR").unwrap().shape(),
            vec![1, 4, 8, 512]
        );
    }

    #[test]
    fn numeric_global_attribute_is_type_mismatch() {
        let mut dataset = dataset();
        dataset.put_attribute(Scope::Global, "AmbisonicsOrder", 1i64).unwrap();

        let err = dataset.global_attribute_as_string("AmbisonicsOrder").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { key, .. } if key == "AmbisonicsOrder"));
    }

    #[test]
    fn attribute_lookup() {
        let mut dataset = dataset();
        dataset.put_attribute(Scope::Global, "Title", "Studio").unwrap();
        assert!(dataset.has_attribute(Scope::Global, "Title"));
        assert_eq!(dataset.global_attribute_as_string("Title").unwrap(), "Studio");

        assert!(matches!(
            dataset.global_attribute_as_string("License"),
            Err(Error::AttributeNotFound { .. })
        ));
        assert!(matches!(
            dataset.put_attribute(Scope::Variable("Nope"), "Units", "meter"),
            Err(Error::VariableNotFound(_))
        ));
    }

    #[test]
    fn undecodable_text_is_type_mismatch() {
        let mut dataset = dataset();
        dataset
            .put_attribute(Scope::Global, "Title", AttributeValue::Char(vec![0xff, 0xfe]))
            .unwrap();
        assert!(matches!(
            dataset.global_attribute_as_string("Title"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn read_only_dataset() {
        let mut dataset = Dataset::new(dataset().into_inner().read_only());
        assert!(matches!(dataset.add_dimension("Q", 1), Err(Error::ReadOnly)));
        assert!(matches!(
            dataset.put_attribute(Scope::Global, "Title", "x"),
            Err(Error::ReadOnly)
        ));
    }
}
