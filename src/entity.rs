//! Listener, Source, Emitter and Receiver variable groups.
//!
//! Each entity is a Position variable plus optional Up and View variables.
//! Everything here is read-only.

use std::fmt;

use crate::container::{Container, Scope};
use crate::dataset::{Dataset, Variable};
use crate::vocabulary::CoordinateType;
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Listener,
    Source,
    Emitter,
    Receiver,
}

impl EntityKind {
    fn prefix(self) -> &'static str {
        match self {
            EntityKind::Listener => "Listener",
            EntityKind::Source => "Source",
            EntityKind::Emitter => "Emitter",
            EntityKind::Receiver => "Receiver",
        }
    }

    pub fn position_name(self) -> String {
        format!("{}Position", self.prefix())
    }

    pub fn up_name(self) -> String {
        format!("{}Up", self.prefix())
    }

    pub fn view_name(self) -> String {
        format!("{}View", self.prefix())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

pub struct Entity<'a, C> {
    dataset: &'a Dataset<C>,
    kind: EntityKind,
    position: Option<Variable>,
    up: Option<Variable>,
    view: Option<Variable>,
}

impl<'a, C: Container> Entity<'a, C> {
    pub fn new(
        dataset: &'a Dataset<C>,
        kind: EntityKind,
        position: Option<Variable>,
        up: Option<Variable>,
        view: Option<Variable>,
    ) -> Self {
        Entity {
            dataset,
            kind,
            position,
            up,
            view,
        }
    }

    /// Look up `<Kind>Position`, `<Kind>Up` and `<Kind>View` in `dataset`.
    pub fn open(dataset: &'a Dataset<C>, kind: EntityKind) -> Self {
        Entity::new(
            dataset,
            kind,
            dataset.variable(&kind.position_name()),
            dataset.variable(&kind.up_name()),
            dataset.variable(&kind.view_name()),
        )
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn position(&self) -> Option<&Variable> {
        self.position.as_ref()
    }

    pub fn up(&self) -> Option<&Variable> {
        self.up.as_ref()
    }

    pub fn view(&self) -> Option<&Variable> {
        self.view.as_ref()
    }

    pub fn has_up(&self) -> bool {
        self.up.is_some()
    }

    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Position must exist. Up and View, when present, need a `Type` of
    /// `cartesian` or `spherical` and a `Units` attribute.
    pub fn validate(&self) -> Result<()> {
        if self.position.is_none() {
            return Err(Error::MissingRequiredVariable(self.kind.position_name()));
        }

        for variable in [&self.up, &self.view].into_iter().flatten() {
            self.check_coordinates(variable)?;
        }

        Ok(())
    }

    fn check_coordinates(&self, variable: &Variable) -> Result<()> {
        let scope = Scope::Variable(variable.name());

        let kind = self.dataset.attribute_as_string(scope, "Type")?;
        if !CoordinateType::is_valid(&kind) {
            return Err(Error::InvalidCoordinateType {
                variable: variable.name().to_owned(),
                found: kind,
            });
        }

        self.dataset.attribute_as_string(scope, "Units")?;
        Ok(())
    }

    pub fn position_has_dimensions(&self, expected: &[usize]) -> bool {
        has_dimensions(&self.position, expected)
    }

    pub fn up_has_dimensions(&self, expected: &[usize]) -> bool {
        has_dimensions(&self.up, expected)
    }

    pub fn view_has_dimensions(&self, expected: &[usize]) -> bool {
        has_dimensions(&self.view, expected)
    }
}

fn has_dimensions(variable: &Option<Variable>, expected: &[usize]) -> bool {
    variable
        .as_ref()
        .is_some_and(|variable| variable.has_dimensions(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ElementType;

    fn dataset() -> Dataset {
        let mut dataset = Dataset::in_memory();
        dataset.add_dimension("I", 1).unwrap();
        dataset.add_dimension("C", 3).unwrap();
        dataset.add_dimension("M", 5).unwrap();

        for name in ["ListenerPosition", "ListenerUp"] {
            dataset
                .add_variable(name, ElementType::Double, &["M", "C"])
                .unwrap();
            dataset
                .put_attribute(Scope::Variable(name), "Type", "cartesian")
                .unwrap();
            dataset
                .put_attribute(Scope::Variable(name), "Units", "meter")
                .unwrap();
        }

        dataset
    }

    #[test]
    fn listener_dimensions() {
        let dataset = dataset();
        let listener = Entity::open(&dataset, EntityKind::Listener);

        assert!(listener.is_valid());
        assert!(listener.has_up());
        assert!(!listener.has_view());
        assert!(listener.position_has_dimensions(&[5, 3]));
        assert!(!listener.position_has_dimensions(&[1, 3]));
        assert!(!listener.position_has_dimensions(&[5, 3, 1]));
        assert!(listener.up_has_dimensions(&[5, 3]));
        assert!(!listener.view_has_dimensions(&[5, 3]));
    }

    #[test]
    fn missing_position() {
        let dataset = dataset();
        let source = Entity::open(&dataset, EntityKind::Source);

        assert!(matches!(
            source.validate(),
            Err(Error::MissingRequiredVariable(name)) if name == "SourcePosition"
        ));
    }

    #[test]
    fn bad_coordinate_type() {
        let mut dataset = dataset();
        dataset
            .put_attribute(Scope::Variable("ListenerUp"), "Type", "polar")
            .unwrap();

        let listener = Entity::open(&dataset, EntityKind::Listener);
        assert!(matches!(
            listener.validate(),
            Err(Error::InvalidCoordinateType { variable, found })
                if variable == "ListenerUp" && found == "polar"
        ));
    }

    #[test]
    fn up_without_units() {
        let mut dataset = dataset();
        dataset
            .add_variable("ListenerView", ElementType::Double, &["I", "C"])
            .unwrap();
        dataset
            .put_attribute(Scope::Variable("ListenerView"), "Type", "spherical")
            .unwrap();

        let listener = Entity::open(&dataset, EntityKind::Listener);
        assert!(matches!(
            listener.validate(),
            Err(Error::AttributeNotFound { key, .. }) if key == "Units"
        ));
    }
}
