use super::{missing_variable, AttributeValue, Container, ElementType, Scope, NC_FILL_DOUBLE};
use crate::{Error, Result};

#[derive(Clone, Debug)]
struct Slot {
    name: String,
    element_type: ElementType,
    dims: Vec<String>,
    fill: Option<f64>,
    /// Allocated on first write
    data: Option<Vec<f64>>,
    attributes: Vec<(String, AttributeValue)>,
}

/// In-memory container keeping dimensions, variables and attributes in
/// declaration order.
#[derive(Clone, Debug)]
pub struct MemoryContainer {
    writable: bool,
    dimensions: Vec<(String, usize)>,
    variables: Vec<Slot>,
    attributes: Vec<(String, AttributeValue)>,
}

impl MemoryContainer {
    /// Create an empty, writable container.
    pub fn new() -> Self {
        Default::default()
    }

    /// Freeze the container, every later mutation is rejected.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    fn slot(&self, name: &str) -> Option<&Slot> {
        self.variables.iter().find(|slot| slot.name == name)
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut Slot> {
        self.variables
            .iter_mut()
            .find(|slot| slot.name == name)
            .ok_or_else(|| missing_variable(name))
    }

    fn len_of(&self, slot: &Slot) -> Result<usize> {
        slot.dims.iter().try_fold(1usize, |len, dim| {
            self.dimension(dim)
                .map(|size| len * size)
                .ok_or_else(|| Error::DimensionNotFound(dim.clone()))
        })
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.writable {
            true => Ok(()),
            false => Err(Error::ReadOnly),
        }
    }
}

impl Default for MemoryContainer {
    fn default() -> Self {
        MemoryContainer {
            writable: true,
            dimensions: Vec::new(),
            variables: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

fn upsert(attributes: &mut Vec<(String, AttributeValue)>, key: &str, value: AttributeValue) {
    match attributes.iter_mut().find(|(k, _)| k == key) {
        Some((_, slot)) => *slot = value,
        None => attributes.push((key.to_owned(), value)),
    }
}

impl Container for MemoryContainer {
    fn is_writable(&self) -> bool {
        self.writable
    }

    fn dimension(&self, name: &str) -> Option<usize> {
        self.dimensions
            .iter()
            .find(|(dim, _)| dim == name)
            .map(|(_, size)| *size)
    }

    fn add_dimension(&mut self, name: &str, size: usize) -> Result<()> {
        self.ensure_writable()?;
        self.dimensions.push((name.to_owned(), size));
        Ok(())
    }

    fn variable_dimensions(&self, name: &str) -> Option<Vec<String>> {
        self.slot(name).map(|slot| slot.dims.clone())
    }

    fn add_variable(
        &mut self,
        name: &str,
        element_type: ElementType,
        dims: &[&str],
    ) -> Result<()> {
        self.ensure_writable()?;
        self.variables.push(Slot {
            name: name.to_owned(),
            element_type,
            dims: dims.iter().map(|dim| (*dim).to_owned()).collect(),
            fill: Some(NC_FILL_DOUBLE),
            data: None,
            attributes: Vec::new(),
        });
        Ok(())
    }

    fn attribute(&self, scope: Scope<'_>, key: &str) -> Option<AttributeValue> {
        let attributes = match scope {
            Scope::Global => &self.attributes,
            Scope::Variable(name) => &self.slot(name)?.attributes,
        };

        attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.clone())
    }

    fn put_attribute(&mut self, scope: Scope<'_>, key: &str, value: AttributeValue) -> Result<()> {
        self.ensure_writable()?;

        match scope {
            Scope::Global => upsert(&mut self.attributes, key, value),
            Scope::Variable(name) => upsert(&mut self.slot_mut(name)?.attributes, key, value),
        }

        Ok(())
    }

    fn read_values(&self, name: &str) -> Result<Vec<f64>> {
        let slot = self.slot(name).ok_or_else(|| missing_variable(name))?;

        match &slot.data {
            Some(data) => Ok(data.clone()),
            None => Ok(vec![slot.fill.unwrap_or(0.0); self.len_of(slot)?]),
        }
    }

    fn write_values(&mut self, name: &str, start: usize, values: &[f64]) -> Result<()> {
        self.ensure_writable()?;

        let len = {
            let slot = self.slot(name).ok_or_else(|| missing_variable(name))?;
            self.len_of(slot)?
        };

        let end = start.checked_add(values.len()).filter(|end| *end <= len);
        if end.is_none() {
            return Err(Error::LengthMismatch {
                variable: name.to_owned(),
                expected: len,
                found: start.saturating_add(values.len()),
            });
        }

        let slot = self.slot_mut(name)?;
        let fill = slot.fill.unwrap_or(0.0);
        let element_type = slot.element_type;
        let data = slot.data.get_or_insert_with(|| vec![fill; len]);

        for (dst, src) in data[start..].iter_mut().zip(values) {
            *dst = match element_type {
                ElementType::Double => *src,
                ElementType::Float => f64::from(*src as f32),
            };
        }

        Ok(())
    }

    fn set_fill(&mut self, name: &str, fill: Option<f64>) -> Result<()> {
        self.ensure_writable()?;
        self.slot_mut(name)?.fill = fill;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> MemoryContainer {
        let mut container = MemoryContainer::new();
        container.add_dimension("M", 2).unwrap();
        container.add_dimension("C", 3).unwrap();
        container
            .add_variable("ListenerPosition", ElementType::Double, &["M", "C"])
            .unwrap();
        container
    }

    #[test]
    fn unwritten_values_use_fill() {
        let mut container = container();
        assert_eq!(
            container.read_values("ListenerPosition").unwrap(),
            vec![NC_FILL_DOUBLE; 6]
        );

        container.set_fill("ListenerPosition", Some(0.5)).unwrap();
        container.write_values("ListenerPosition", 3, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            container.read_values("ListenerPosition").unwrap(),
            vec![0.5, 0.5, 0.5, 1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn write_out_of_range() {
        let mut container = container();
        assert!(matches!(
            container.write_values("ListenerPosition", usize::MAX, &[1.0]),
            Err(Error::LengthMismatch { expected: 6, .. })
        ));
        assert!(matches!(
            container.write_values("ListenerPosition", 5, &[1.0, 2.0]),
            Err(Error::LengthMismatch { expected: 6, found: 7, .. })
        ));
    }

    #[test]
    fn float_variables_round_through_f32() {
        let mut container = container();
        container.add_variable("Data.Delay", ElementType::Float, &["M"]).unwrap();
        container.write_values("Data.Delay", 0, &[0.1, 0.2]).unwrap();

        let values = container.read_values("Data.Delay").unwrap();
        assert_eq!(values, vec![f64::from(0.1f32), f64::from(0.2f32)]);
    }

    #[test]
    fn attributes_are_replaced() {
        let mut container = container();
        container.put_attribute(Scope::Global, "Title", "a".into()).unwrap();
        container.put_attribute(Scope::Global, "Title", "b".into()).unwrap();
        assert_eq!(container.attribute(Scope::Global, "Title"), Some("b".into()));
    }

    #[test]
    fn read_only_rejects_writes() {
        let mut container = container().read_only();
        assert!(matches!(container.add_dimension("E", 1), Err(Error::ReadOnly)));
        assert!(matches!(
            container.put_attribute(Scope::Global, "Title", "x".into()),
            Err(Error::ReadOnly)
        ));
        assert!(matches!(
            container.write_values("ListenerPosition", 0, &[0.0]),
            Err(Error::ReadOnly)
        ));
    }
}
