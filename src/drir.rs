//! The `AmbisonicsDRIR` convention.
//!
//! AmbisonicsDRIR extends GeneralFIRE for directional room impulse responses
//! recorded with Ambisonics microphones. Ambisonics channels are stored along
//! the receiver dimension `R`, so `ReceiverPosition` carries no information.
//!
//! On top of GeneralFIRE the convention requires:
//!
//! - global attributes `AmbisonicsOrder` (free-form text, e.g. `"1"` or
//!   `"2v1h"`), `AmbisonicsChannelOrdering` and `AmbisonicsNormalization`,
//! - `ChannelOrdering` and `Normalization` attributes on `Data.IR`,
//! - `ListenerUp` and `ListenerView`, each `[I,C]` or `[M,C]`.

use std::fmt;

use crate::container::{Container, MemoryContainer, Scope};
use crate::dataset::Dataset;
use crate::entity::{Entity, EntityKind};
use crate::file;
use crate::vocabulary::{AmbisonicsChannelOrdering, AmbisonicsNormalization, DataType, Units};
use crate::{Error, Result};

pub const CONVENTION: &str = "AmbisonicsDRIR";

/// Progress of [`AmbisonicsDrir::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Unchecked,
    GlobalAttributesChecked,
    ListenerChecked,
    EmitterChecked,
    Valid,
    /// A check failed. Nothing is read until the dataset validates again.
    Invalid,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct Check<C> {
    reached: Stage,
    run: fn(&Dataset<C>) -> Result<()>,
}

/// Sizes of the convention dimensions, `C` is always 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Dims {
    i: usize,
    m: usize,
    r: usize,
    e: usize,
    n: usize,
}

fn dimension<C: Container>(
    dataset: &Dataset<C>,
    name: &str,
    expected: &'static str,
    ok: fn(usize) -> bool,
) -> Result<usize> {
    let size = dataset
        .dimension(name)
        .ok_or_else(|| Error::DimensionNotFound(name.to_owned()))?;

    match ok(size) {
        true => Ok(size),
        false => Err(Error::InvalidDimension {
            name: name.to_owned(),
            size,
            expected,
        }),
    }
}

fn singleton<C: Container>(dataset: &Dataset<C>) -> Result<usize> {
    dimension(dataset, "I", "1", |size| size == 1)
}

fn coordinates<C: Container>(dataset: &Dataset<C>) -> Result<usize> {
    dimension(dataset, "C", "3", |size| size == 3)
}

fn positive<C: Container>(dataset: &Dataset<C>, name: &str) -> Result<usize> {
    dimension(dataset, name, "> 0", |size| size > 0)
}

fn shape_mismatch(variable: &str, expected: &str, found: Option<Vec<usize>>) -> Error {
    Error::ShapeMismatch {
        variable: variable.to_owned(),
        expected: expected.to_owned(),
        found: found.unwrap_or_default(),
    }
}

fn ensure_shape<C: Container>(
    dataset: &Dataset<C>,
    name: &str,
    label: &str,
    options: &[&[usize]],
) -> Result<()> {
    let variable = dataset
        .variable(name)
        .ok_or_else(|| Error::MissingRequiredVariable(name.to_owned()))?;

    match options.iter().any(|dims| variable.has_dimensions(dims)) {
        true => Ok(()),
        false => Err(shape_mismatch(name, label, Some(variable.shape()))),
    }
}

fn check_global_attributes<C: Container>(dataset: &Dataset<C>) -> Result<()> {
    file::check(dataset)?;
    file::ensure_data_type(dataset, DataType::Fire)?;
    file::ensure_convention(dataset, CONVENTION)?;

    file::ensure_global_attribute(dataset, "AmbisonicsOrder")?;
    file::ensure_global_attribute(dataset, "AmbisonicsChannelOrdering")?
        .parse::<AmbisonicsChannelOrdering>()?;
    file::ensure_global_attribute(dataset, "AmbisonicsNormalization")?
        .parse::<AmbisonicsNormalization>()?;

    Ok(())
}

fn check_listener_variables<C: Container>(dataset: &Dataset<C>) -> Result<()> {
    let i = singleton(dataset)?;
    let c = coordinates(dataset)?;
    let m = positive(dataset, "M")?;
    let r = positive(dataset, "R")?;

    check_order(dataset, r);

    let listener = Entity::open(dataset, EntityKind::Listener);
    listener.validate()?;

    if !listener.position_has_dimensions(&[i, c]) && !listener.position_has_dimensions(&[m, c]) {
        return Err(shape_mismatch(
            "ListenerPosition",
            "[I,C] or [M,C]",
            listener.position().map(|var| var.shape()),
        ));
    }

    if !listener.has_up() {
        return Err(Error::MissingRequiredVariable("ListenerUp".into()));
    }
    if !listener.up_has_dimensions(&[i, c]) && !listener.up_has_dimensions(&[m, c]) {
        return Err(shape_mismatch(
            "ListenerUp",
            "[I,C] or [M,C]",
            listener.up().map(|var| var.shape()),
        ));
    }

    if !listener.has_view() {
        return Err(Error::MissingRequiredVariable("ListenerView".into()));
    }
    if !listener.view_has_dimensions(&[i, c]) && !listener.view_has_dimensions(&[m, c]) {
        return Err(shape_mismatch(
            "ListenerView",
            "[I,C] or [M,C]",
            listener.view().map(|var| var.shape()),
        ));
    }

    Ok(())
}

/// Plain integer orders imply `(order + 1)^2` channels. Mixed orders such as
/// `"2v1h"` are not checked.
fn check_order<C: Container>(dataset: &Dataset<C>, receivers: usize) {
    let Ok(order) = dataset.global_attribute_as_string("AmbisonicsOrder") else {
        return;
    };

    let Ok(n) = order.trim().parse::<usize>() else {
        log::debug!("Not checking channel count for AmbisonicsOrder `{order}`");
        return;
    };

    match n.checked_add(1).and_then(|k| k.checked_mul(k)) {
        Some(channels) if channels != receivers => {
            log::warn!("AmbisonicsOrder {n} implies {channels} channels, R is {receivers}")
        }
        Some(_) => {}
        None => log::debug!("AmbisonicsOrder {n} is too large to check the channel count"),
    }
}

fn check_emitter_variables<C: Container>(dataset: &Dataset<C>) -> Result<()> {
    let i = singleton(dataset)?;
    let c = coordinates(dataset)?;
    let m = positive(dataset, "M")?;
    let e = positive(dataset, "E")?;
    positive(dataset, "N")?;

    let source = Entity::open(dataset, EntityKind::Source);
    source.validate()?;

    if !source.position_has_dimensions(&[i, c]) {
        return Err(shape_mismatch(
            "SourcePosition",
            "[I,C]",
            source.position().map(|var| var.shape()),
        ));
    }

    let emitter = Entity::open(dataset, EntityKind::Emitter);
    emitter.validate()?;

    if !emitter.position_has_dimensions(&[e, c, m]) {
        return Err(shape_mismatch(
            "EmitterPosition",
            "[E,C,M]",
            emitter.position().map(|var| var.shape()),
        ));
    }

    if emitter.has_up()
        && !emitter.up_has_dimensions(&[e, c, i])
        && !emitter.up_has_dimensions(&[e, c, m])
    {
        return Err(shape_mismatch(
            "EmitterUp",
            "[E,C,I] or [E,C,M]",
            emitter.up().map(|var| var.shape()),
        ));
    }

    if emitter.has_view()
        && !emitter.view_has_dimensions(&[e, c, i])
        && !emitter.view_has_dimensions(&[e, c, m])
    {
        return Err(shape_mismatch(
            "EmitterView",
            "[E,C,I] or [E,C,M]",
            emitter.view().map(|var| var.shape()),
        ));
    }

    Ok(())
}

fn check_data_variables<C: Container>(dataset: &Dataset<C>) -> Result<()> {
    let d = read_dims(dataset)?;

    ensure_shape(dataset, "Data.SamplingRate", "[I]", &[&[d.i]])?;
    let units = dataset.attribute_as_string(Scope::Variable("Data.SamplingRate"), "Units")?;
    if units.parse::<Units>()? != Units::Hertz {
        return Err(Error::InvalidAttributeValue {
            key: "Data.SamplingRate:Units".into(),
            expected: format!("`{}`", Units::Hertz),
            found: units,
        });
    }

    ensure_shape(dataset, "Data.IR", "[M,R,E,N]", &[&[d.m, d.r, d.e, d.n]])?;
    let scope = Scope::Variable("Data.IR");
    dataset
        .attribute_as_string(scope, "ChannelOrdering")?
        .parse::<AmbisonicsChannelOrdering>()?;
    dataset
        .attribute_as_string(scope, "Normalization")?
        .parse::<AmbisonicsNormalization>()?;

    ensure_shape(
        dataset,
        "Data.Delay",
        "[I,R,E] or [M,R,E]",
        &[&[d.i, d.r, d.e], &[d.m, d.r, d.e]],
    )?;

    Ok(())
}

fn read_dims<C: Container>(dataset: &Dataset<C>) -> Result<Dims> {
    let i = singleton(dataset)?;
    coordinates(dataset)?;

    Ok(Dims {
        i,
        m: positive(dataset, "M")?,
        r: positive(dataset, "R")?,
        e: positive(dataset, "E")?,
        n: positive(dataset, "N")?,
    })
}

/// A dataset checked against the AmbisonicsDRIR convention.
///
/// ```
/// use sofa_drir::{AmbisonicsDrir, Dataset, DrirBuilder};
///
/// let dataset = DrirBuilder::new(1, 4, 2, 16)
///     .with_title("studio")
///     .build(Dataset::in_memory())
///     .unwrap();
///
/// let mut drir = AmbisonicsDrir::new(dataset);
/// drir.validate().unwrap();
///
/// assert_eq!(drir.sampling_rate().unwrap(), 48000.0);
/// ```
pub struct AmbisonicsDrir<C = MemoryContainer> {
    dataset: Dataset<C>,
    stage: Stage,
}

impl<C: Container> AmbisonicsDrir<C> {
    pub const CONVENTION_VERSION_MAJOR: u32 = 0;
    pub const CONVENTION_VERSION_MINOR: u32 = 1;
    pub const CONVENTION_VERSION: &'static str = "0.1";

    pub fn convention_version() -> String {
        format!(
            "{}.{}",
            Self::CONVENTION_VERSION_MAJOR,
            Self::CONVENTION_VERSION_MINOR
        )
    }

    pub fn new(dataset: Dataset<C>) -> Self {
        AmbisonicsDrir {
            dataset,
            stage: Stage::Unchecked,
        }
    }

    fn checks() -> [Check<C>; 4] {
        [
            Check {
                reached: Stage::GlobalAttributesChecked,
                run: check_global_attributes,
            },
            Check {
                reached: Stage::ListenerChecked,
                run: check_listener_variables,
            },
            Check {
                reached: Stage::EmitterChecked,
                run: check_emitter_variables,
            },
            Check {
                reached: Stage::Valid,
                run: check_data_variables,
            },
        ]
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn dataset(&self) -> &Dataset<C> {
        &self.dataset
    }

    /// Mutable access to the dataset. Validation has to run again afterwards.
    pub fn dataset_mut(&mut self) -> &mut Dataset<C> {
        self.stage = Stage::Unchecked;
        &mut self.dataset
    }

    pub fn into_inner(self) -> Dataset<C> {
        self.dataset
    }

    /// Run every check in order and stop at the first violated invariant.
    pub fn validate(&mut self) -> Result<()> {
        if self.stage == Stage::Valid {
            return Ok(());
        }

        self.stage = Stage::Unchecked;

        for check in Self::checks() {
            if let Err(err) = (check.run)(&self.dataset) {
                log::debug!("{CONVENTION} validation failed after {}: {err}", self.stage);
                self.stage = Stage::Invalid;
                return Err(err);
            }

            log::debug!("{CONVENTION} validation: {} -> {}", self.stage, check.reached);
            self.stage = check.reached;
        }

        debug_assert_eq!(self.dataset.dimension("I"), Some(1));
        debug_assert_eq!(self.dataset.dimension("C"), Some(3));

        Ok(())
    }

    pub fn is_valid(&mut self) -> bool {
        self.validate().is_ok()
    }

    fn require_valid(&self, operation: &'static str) -> Result<()> {
        match self.stage {
            Stage::Valid => Ok(()),
            _ => Err(Error::PreconditionViolation(operation)),
        }
    }

    fn dim(&self, operation: &'static str, name: &str) -> Result<usize> {
        self.require_valid(operation)?;
        self.dataset
            .dimension(name)
            .ok_or_else(|| Error::DimensionNotFound(name.to_owned()))
    }

    pub fn num_measurements(&self) -> Result<usize> {
        self.dim("num_measurements", "M")
    }

    pub fn num_receivers(&self) -> Result<usize> {
        self.dim("num_receivers", "R")
    }

    pub fn num_emitters(&self) -> Result<usize> {
        self.dim("num_emitters", "E")
    }

    pub fn num_samples(&self) -> Result<usize> {
        self.dim("num_samples", "N")
    }

    /// `Data.SamplingRate`, which is `[I]` in this convention.
    pub fn sampling_rate(&self) -> Result<f64> {
        self.require_valid("sampling_rate")?;

        let variable = self.dataset.require_variable("Data.SamplingRate")?;
        let values = self.dataset.values(&variable)?;

        values.first().copied().ok_or(Error::LengthMismatch {
            variable: "Data.SamplingRate".into(),
            expected: 1,
            found: 0,
        })
    }

    pub fn sampling_rate_units(&self) -> Result<Units> {
        self.require_valid("sampling_rate_units")?;
        self.dataset
            .attribute_as_string(Scope::Variable("Data.SamplingRate"), "Units")?
            .parse()
    }

    pub fn ambisonics_order(&self) -> Result<String> {
        self.require_valid("ambisonics_order")?;
        self.dataset.global_attribute_as_string("AmbisonicsOrder")
    }

    pub fn channel_ordering(&self) -> Result<AmbisonicsChannelOrdering> {
        self.require_valid("channel_ordering")?;
        self.dataset
            .attribute_as_string(Scope::Variable("Data.IR"), "ChannelOrdering")?
            .parse()
    }

    pub fn normalization(&self) -> Result<AmbisonicsNormalization> {
        self.require_valid("normalization")?;
        self.dataset
            .attribute_as_string(Scope::Variable("Data.IR"), "Normalization")?
            .parse()
    }

    /// `Data.IR` as `[M,R,E,N]` in row-major order.
    pub fn data_ir(&self) -> Result<Vec<f64>> {
        self.require_valid("data_ir")?;
        let variable = self.dataset.require_variable("Data.IR")?;
        self.dataset.values(&variable)
    }

    /// Read `Data.IR` into `buf`, which the caller sized for `[m, r, e, n]`.
    pub fn data_ir_into(
        &self,
        buf: &mut [f64],
        m: usize,
        r: usize,
        e: usize,
        n: usize,
    ) -> Result<()> {
        self.require_valid("data_ir_into")?;
        self.dataset.get_values(buf, &[m, r, e, n], "Data.IR")
    }

    /// `Data.Delay`, either `[I,R,E]` or `[M,R,E]`.
    pub fn data_delay(&self) -> Result<Vec<f64>> {
        self.require_valid("data_delay")?;
        let variable = self.dataset.require_variable("Data.Delay")?;
        self.dataset.values(&variable)
    }

    pub fn data_delay_into(
        &self,
        buf: &mut [f64],
        dim1: usize,
        dim2: usize,
        dim3: usize,
    ) -> Result<()> {
        self.require_valid("data_delay_into")?;
        self.dataset.get_values(buf, &[dim1, dim2, dim3], "Data.Delay")
    }

    /// One position per row of `ListenerPosition`, so either one or `M`.
    pub fn listener_positions(&self) -> Result<Vec<[f64; 3]>> {
        self.require_valid("listener_positions")?;
        let variable = self.dataset.require_variable("ListenerPosition")?;
        let values = self.dataset.values(&variable)?;

        Ok(values
            .chunks_exact(3)
            .map(|xyz| [xyz[0], xyz[1], xyz[2]])
            .collect())
    }

    /// Emitter positions per measurement, indexed `[m][e]`.
    pub fn emitter_positions(&self) -> Result<Vec<Vec<[f64; 3]>>> {
        self.require_valid("emitter_positions")?;
        let variable = self.dataset.require_variable("EmitterPosition")?;
        let values = self.dataset.values(&variable)?;

        let shape = variable.shape();
        let (e, c, m) = (shape[0], shape[1], shape[2]);
        let at = |ei: usize, ci: usize, mi: usize| values[ei * c * m + ci * m + mi];

        Ok((0..m)
            .map(|mi| {
                (0..e)
                    .map(|ei| [at(ei, 0, mi), at(ei, 1, mi), at(ei, 2, mi)])
                    .collect()
            })
            .collect())
    }
}

#[cfg(feature = "mysofa")]
impl AmbisonicsDrir<crate::container::SofaFile> {
    /// Open a SOFA file read-only and validate it.
    ///
    /// ```no_run
    /// use sofa_drir::AmbisonicsDrir;
    ///
    /// let drir = AmbisonicsDrir::open("my/sofa/file.sofa").unwrap();
    /// let ir = drir.data_ir().unwrap();
    /// ```
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = crate::container::SofaFile::open(path)?;
        let mut drir = AmbisonicsDrir::new(Dataset::new(file));
        drir.validate()?;
        Ok(drir)
    }
}
