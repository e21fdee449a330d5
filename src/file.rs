//! Checks shared by every SOFA convention.

use crate::container::Container;
use crate::dataset::Dataset;
use crate::vocabulary::{DataType, RoomType};
use crate::{Error, Result};

/// Global attributes every SOFA file must carry.
pub const REQUIRED_ATTRIBUTES: &[&str] = &[
    "Conventions",
    "Version",
    "SOFAConventions",
    "SOFAConventionsVersion",
    "APIName",
    "APIVersion",
    "DataType",
    "RoomType",
    "Title",
];

pub fn ensure_global_attribute<C: Container>(dataset: &Dataset<C>, key: &str) -> Result<String> {
    dataset.global_attribute_as_string(key)
}

fn ensure_value<C: Container>(dataset: &Dataset<C>, key: &str, expected: &str) -> Result<()> {
    let found = dataset.global_attribute_as_string(key)?;

    if found != expected {
        return Err(Error::InvalidAttributeValue {
            key: key.to_owned(),
            expected: format!("`{expected}`"),
            found,
        });
    }

    Ok(())
}

pub fn ensure_convention<C: Container>(dataset: &Dataset<C>, name: &str) -> Result<()> {
    ensure_value(dataset, "SOFAConventions", name)
}

pub fn ensure_data_type<C: Container>(dataset: &Dataset<C>, data_type: DataType) -> Result<()> {
    ensure_value(dataset, "DataType", data_type.name())
}

/// Convention-independent structure of a SOFA file.
pub fn check<C: Container>(dataset: &Dataset<C>) -> Result<()> {
    for key in REQUIRED_ATTRIBUTES {
        ensure_global_attribute(dataset, key)?;
    }

    ensure_value(dataset, "Conventions", "SOFA")?;

    let data_type = dataset.global_attribute_as_string("DataType")?;
    data_type.parse::<DataType>()?;

    let room_type = dataset.global_attribute_as_string("RoomType")?;
    room_type.parse::<RoomType>()?;

    Ok(())
}
