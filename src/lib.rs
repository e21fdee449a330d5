//! # sofa-drir
//!
//! Writer and validator for `SOFA` (Spatially Oriented Format for Acoustics)
//! datasets following the `AmbisonicsDRIR` convention: directional room
//! impulse responses measured with an Ambisonics microphone.
//!
//! A [`Dataset`] is a netCDF-style collection of dimensions, variables and
//! attributes on top of a [`Container`]. [`DrirBuilder`] lays out a complete
//! AmbisonicsDRIR dataset and [`AmbisonicsDrir`] checks an existing one
//! against the convention before handing out its contents.
//!
//! With the `mysofa` feature enabled, existing files can be opened read-only
//! through [`libmysofa`].
//!
//! [`libmysofa`]: https://github.com/hoene/libmysofa
//!
//! # Example
//!
//! ```
//! use sofa_drir::{AmbisonicsChannelOrdering, AmbisonicsDrir, Dataset, DrirBuilder};
//!
//! // One measurement, first order Ambisonics (4 channels), 2 loudspeakers
//! let dataset = DrirBuilder::new(1, 4, 2, 256)
//!     .with_title("Listening room")
//!     .with_sampling_rate(48000.0)
//!     .with_emitter_positions(vec![[2.0, 1.0, 0.0], [2.0, -1.0, 0.0]])
//!     .build(Dataset::in_memory())
//!     .unwrap();
//!
//! let mut drir = AmbisonicsDrir::new(dataset);
//! drir.validate().unwrap();
//!
//! assert_eq!(drir.num_receivers().unwrap(), 4);
//! assert_eq!(drir.channel_ordering().unwrap(), AmbisonicsChannelOrdering::Acn);
//!
//! let ir = drir.data_ir().unwrap();
//! assert_eq!(ir.len(), 4 * 2 * 256);
//! ```

mod builder;
pub mod container;
pub mod convert;
mod dataset;
pub mod drir;
pub mod entity;
mod error;
pub mod file;
pub mod vocabulary;

pub use builder::DrirBuilder;
#[cfg(feature = "mysofa")]
pub use container::SofaFile;
pub use container::{AttributeValue, Container, ElementType, MemoryContainer, Scope};
pub use dataset::{Dataset, Dimension, Fill, Variable};
pub use drir::{AmbisonicsDrir, Stage};
pub use entity::{Entity, EntityKind};
pub use error::{Error, Result};
pub use vocabulary::{
    AmbisonicsChannelOrdering, AmbisonicsNormalization, CoordinateType, DataType, RoomType, Units,
};
