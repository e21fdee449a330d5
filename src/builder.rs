//! Construction of AmbisonicsDRIR datasets.
//!
//! Datasets are written append-only: global attributes, then dimensions, then
//! variables with their attributes, then data.

use crate::container::{Container, ElementType, Scope};
use crate::dataset::{Dataset, Fill, Variable};
use crate::drir::{AmbisonicsDrir, CONVENTION};
use crate::vocabulary::{
    AmbisonicsChannelOrdering, AmbisonicsNormalization, CoordinateType, DataType, RoomType, Units,
};
use crate::{Error, Result};

const DEFAULT_SAMPLE_RATE: f64 = 48000.0;
const DEFAULT_ORDER: &str = "1";
const DEFAULT_TITLE: &str = "AmbisonicsDRIR";

const SOFA_VERSION: &str = "1.0";

const DEFAULT_UP: [f64; 3] = [0.0, 0.0, 1.0];
const DEFAULT_VIEW: [f64; 3] = [1.0, 0.0, 0.0];

#[must_use]
#[derive(Clone, Debug)]
pub struct DrirBuilder {
    m: usize,
    r: usize,
    e: usize,
    n: usize,
    title: String,
    application: Option<(String, String)>,
    sample_rate: f64,
    order: String,
    channel_ordering: AmbisonicsChannelOrdering,
    normalization: AmbisonicsNormalization,
    room_type: RoomType,
    listener_positions: Vec<[f64; 3]>,
    listener_up: [f64; 3],
    listener_view: [f64; 3],
    source_position: [f64; 3],
    emitter_positions: Option<Vec<[f64; 3]>>,
    data_ir: Option<Vec<f64>>,
    data_delay: Option<Vec<f64>>,
    attributes: Vec<(String, String)>,
}

impl DrirBuilder {
    /// Dataset with `m` measurements, `r` Ambisonics channels, `e` emitters
    /// and `n` samples per impulse response.
    pub fn new(m: usize, r: usize, e: usize, n: usize) -> DrirBuilder {
        DrirBuilder {
            m,
            r,
            e,
            n,
            title: DEFAULT_TITLE.into(),
            application: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            order: DEFAULT_ORDER.into(),
            channel_ordering: AmbisonicsChannelOrdering::Acn,
            normalization: AmbisonicsNormalization::Sn3d,
            room_type: RoomType::Reverberant,
            listener_positions: vec![[0.0; 3]],
            listener_up: DEFAULT_UP,
            listener_view: DEFAULT_VIEW,
            source_position: [0.0; 3],
            emitter_positions: None,
            data_ir: None,
            data_delay: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Name and version of the program producing the file.
    pub fn with_application(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.application = Some((name.into(), version.into()));
        self
    }

    /// Set sampling rate of the impulse responses. Default value is 48_000.0.
    pub fn with_sampling_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Ambisonics order, stored as text. Mixed orders such as `"2v1h"` are
    /// allowed. Default value is `"1"`.
    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }

    pub fn with_channel_ordering(mut self, channel_ordering: AmbisonicsChannelOrdering) -> Self {
        self.channel_ordering = channel_ordering;
        self
    }

    pub fn with_normalization(mut self, normalization: AmbisonicsNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn with_room_type(mut self, room_type: RoomType) -> Self {
        self.room_type = room_type;
        self
    }

    /// One position for all measurements, or one per measurement.
    pub fn with_listener_positions(mut self, positions: Vec<[f64; 3]>) -> Self {
        self.listener_positions = positions;
        self
    }

    pub fn with_listener_orientation(mut self, up: [f64; 3], view: [f64; 3]) -> Self {
        self.listener_up = up;
        self.listener_view = view;
        self
    }

    pub fn with_source_position(mut self, position: [f64; 3]) -> Self {
        self.source_position = position;
        self
    }

    /// Loudspeaker positions, one per emitter, shared by all measurements.
    pub fn with_emitter_positions(mut self, positions: Vec<[f64; 3]>) -> Self {
        self.emitter_positions = Some(positions);
        self
    }

    /// Impulse responses laid out as `[M,R,E,N]`.
    pub fn with_data_ir(mut self, data: Vec<f64>) -> Self {
        self.data_ir = Some(data);
        self
    }

    /// Delays laid out as `[I,R,E]` or `[M,R,E]`.
    pub fn with_data_delay(mut self, delay: Vec<f64>) -> Self {
        self.data_delay = Some(delay);
        self
    }

    /// Additional global attribute, e.g. `MicrophoneModel`.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    fn check_len(variable: &str, expected: usize, found: usize) -> Result<()> {
        match expected == found {
            true => Ok(()),
            false => Err(Error::LengthMismatch {
                variable: variable.to_owned(),
                expected,
                found,
            }),
        }
    }

    fn listener_rows(&self) -> Result<&'static str> {
        match self.listener_positions.len() {
            1 => Ok("I"),
            len if len == self.m => Ok("M"),
            len => Err(Error::LengthMismatch {
                variable: "ListenerPosition".into(),
                expected: self.m * 3,
                found: len * 3,
            }),
        }
    }

    fn delay_rows(&self) -> Result<&'static str> {
        let per_row = self.r * self.e;

        match self.data_delay.as_ref().map(Vec::len) {
            None => Ok("I"),
            Some(len) if len == per_row => Ok("I"),
            Some(len) if len == self.m * per_row => Ok("M"),
            Some(len) => Err(Error::LengthMismatch {
                variable: "Data.Delay".into(),
                expected: self.m * per_row,
                found: len,
            }),
        }
    }

    /// Write the dataset into `dataset`, which must be empty and writable.
    pub fn build<C: Container>(self, mut dataset: Dataset<C>) -> Result<Dataset<C>> {
        let listener_rows = self.listener_rows()?;
        let delay_rows = self.delay_rows()?;

        if let Some(positions) = &self.emitter_positions {
            Self::check_len("EmitterPosition", self.e, positions.len())?;
        }
        if let Some(data) = &self.data_ir {
            Self::check_len("Data.IR", self.m * self.r * self.e * self.n, data.len())?;
        }

        log::debug!(
            "Building {CONVENTION} dataset M={} R={} E={} N={}",
            self.m,
            self.r,
            self.e,
            self.n
        );

        self.put_global_attributes(&mut dataset)?;

        for (name, size) in [
            ("C", 3),
            ("I", 1),
            ("M", self.m),
            ("R", self.r),
            ("E", self.e),
            ("N", self.n),
        ] {
            dataset.add_dimension(name, size)?;
        }

        let sampling_rate =
            dataset.add_variable("Data.SamplingRate", ElementType::Double, &["I"])?;
        let scope = Scope::Variable("Data.SamplingRate");
        dataset.put_attribute(scope, "Units", Units::Hertz.name())?;

        let delay_dims = [delay_rows, "R", "E"];
        let delay = dataset.add_variable("Data.Delay", ElementType::Double, &delay_dims)?;
        dataset.set_fill(&delay, Fill::Value(0.0))?;

        let listener_position =
            position(&mut dataset, "ListenerPosition", &[listener_rows, "C"])?;
        let listener_up = position(&mut dataset, "ListenerUp", &["I", "C"])?;
        let listener_view = position(&mut dataset, "ListenerView", &["I", "C"])?;
        position(&mut dataset, "ReceiverPosition", &["R", "C", "I"])?;
        let source_position = position(&mut dataset, "SourcePosition", &["I", "C"])?;
        let emitter_position = position(&mut dataset, "EmitterPosition", &["E", "C", "M"])?;

        let ir = dataset.add_variable("Data.IR", ElementType::Double, &["M", "R", "E", "N"])?;
        let scope = Scope::Variable("Data.IR");
        dataset.put_attribute(scope, "ChannelOrdering", self.channel_ordering.name())?;
        dataset.put_attribute(scope, "Normalization", self.normalization.name())?;
        dataset.set_fill(&ir, Fill::Value(0.0))?;

        dataset.put_values(&sampling_rate, &[self.sample_rate])?;
        dataset.put_values(&listener_position, &self.listener_positions.concat())?;
        dataset.put_values(&listener_up, &self.listener_up)?;
        dataset.put_values(&listener_view, &self.listener_view)?;
        dataset.put_values(&source_position, &self.source_position)?;

        if let Some(positions) = &self.emitter_positions {
            dataset.put_values(&emitter_position, &emitter_layout(positions, self.m))?;
        }
        if let Some(delays) = &self.data_delay {
            dataset.put_values(&delay, delays)?;
        }
        if let Some(data) = &self.data_ir {
            dataset.put_values(&ir, data)?;
        }

        Ok(dataset)
    }

    fn put_global_attributes<C: Container>(&self, dataset: &mut Dataset<C>) -> Result<()> {
        let mut attributes = vec![
            ("Conventions", "SOFA".to_owned()),
            ("Version", SOFA_VERSION.to_owned()),
            ("SOFAConventions", CONVENTION.to_owned()),
            ("SOFAConventionsVersion", AmbisonicsDrir::<C>::convention_version()),
            ("APIName", env!("CARGO_PKG_NAME").to_owned()),
            ("APIVersion", env!("CARGO_PKG_VERSION").to_owned()),
            ("DataType", DataType::Fire.name().to_owned()),
            ("RoomType", self.room_type.name().to_owned()),
            ("Title", self.title.clone()),
            ("AmbisonicsOrder", self.order.clone()),
            ("AmbisonicsChannelOrdering", self.channel_ordering.name().to_owned()),
            ("AmbisonicsNormalization", self.normalization.name().to_owned()),
        ];

        if let Some((name, version)) = &self.application {
            attributes.push(("ApplicationName", name.clone()));
            attributes.push(("ApplicationVersion", version.clone()));
        }

        for (key, value) in attributes {
            dataset.put_attribute(Scope::Global, key, value)?;
        }
        for (key, value) in &self.attributes {
            dataset.put_attribute(Scope::Global, key, value.as_str())?;
        }

        Ok(())
    }
}

fn position<C: Container>(dataset: &mut Dataset<C>, name: &str, dims: &[&str]) -> Result<Variable> {
    let variable = dataset.add_variable(name, ElementType::Double, dims)?;
    dataset.put_attribute(Scope::Variable(name), "Type", CoordinateType::Cartesian.name())?;
    dataset.put_attribute(Scope::Variable(name), "Units", Units::Meter.name())?;
    dataset.set_fill(&variable, Fill::Value(0.0))?;
    Ok(variable)
}

/// Spread per-emitter positions over `[E,C,M]`.
fn emitter_layout(positions: &[[f64; 3]], m: usize) -> Vec<f64> {
    positions
        .iter()
        .flat_map(|xyz| xyz.iter().flat_map(move |coord| std::iter::repeat(*coord).take(m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drir::Stage;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn built_dataset_is_valid() -> anyhow::Result<()> {
        let (m, r, e, n) = (1, 4, 8, 512);
        let ir = (0..m * r * e * n).map(|i| (i % 97) as f64 / 97.0).collect::<Vec<_>>();

        let dataset = DrirBuilder::new(m, r, e, n)
            .with_title("S3A")
            .with_application("convert_S3A_to_AmbisonicsDRIR", "0.1")
            .with_sampling_rate(44100.0)
            .with_channel_ordering(AmbisonicsChannelOrdering::Fuma)
            .with_normalization(AmbisonicsNormalization::Fuma)
            .with_emitter_positions((0..e).map(|i| [i as f64, 1.0, 2.0]).collect())
            .with_data_ir(ir.clone())
            .with_attribute("MicrophoneModel", "Soundfield")
            .build(Dataset::in_memory())?;

        assert_eq!(dataset.global_attribute_as_string("MicrophoneModel")?, "Soundfield");
        assert_eq!(dataset.global_attribute_as_string("ApplicationVersion")?, "0.1");

        let mut drir = AmbisonicsDrir::new(dataset);
        drir.validate()?;
        assert_eq!(drir.stage(), Stage::Valid);

        assert_approx_eq!(drir.sampling_rate()?, 44100.0);
        assert_eq!(drir.channel_ordering()?, AmbisonicsChannelOrdering::Fuma);
        assert_eq!(drir.normalization()?, AmbisonicsNormalization::Fuma);
        assert_eq!(drir.ambisonics_order()?, "1");

        let mut buf = vec![0.0; m * r * e * n];
        drir.data_ir_into(&mut buf, m, r, e, n)?;
        assert_eq!(buf, ir);

        let emitters = drir.emitter_positions()?;
        assert_eq!(emitters.len(), 1);
        assert_eq!(emitters[0][3], [3.0, 1.0, 2.0]);

        Ok(())
    }

    #[test]
    fn emitters_repeat_over_measurements() {
        let layout = emitter_layout(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], 2);
        assert_eq!(
            layout,
            vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 5.0, 5.0, 6.0, 6.0]
        );
    }

    #[test]
    fn listener_per_measurement() -> anyhow::Result<()> {
        let dataset = DrirBuilder::new(3, 4, 1, 4)
            .with_listener_positions(vec![[0.0; 3], [1.0; 3], [2.0; 3]])
            .with_data_delay(vec![0.5; 12])
            .build(Dataset::in_memory())?;

        let mut drir = AmbisonicsDrir::new(dataset);
        drir.validate()?;
        assert_eq!(drir.listener_positions()?[2], [2.0; 3]);
        assert_eq!(drir.data_delay()?, vec![0.5; 12]);
        assert_eq!(drir.emitter_positions()?, vec![vec![[0.0; 3]]; 3]);

        Ok(())
    }

    #[test]
    fn rejects_wrong_lengths() {
        let err = DrirBuilder::new(2, 4, 1, 4)
            .with_listener_positions(vec![[0.0; 3]; 3])
            .build(Dataset::in_memory())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch { variable, .. } if variable == "ListenerPosition"
        ));

        let err = DrirBuilder::new(1, 4, 2, 4)
            .with_data_ir(vec![0.0; 31])
            .build(Dataset::in_memory())
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 32, found: 31, .. }));

        let err = DrirBuilder::new(1, 4, 2, 4)
            .with_emitter_positions(vec![[0.0; 3]])
            .build(Dataset::in_memory())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch { variable, .. } if variable == "EmitterPosition"
        ));
    }

    #[test]
    fn mixed_order_is_accepted() {
        let dataset = DrirBuilder::new(1, 6, 1, 4)
            .with_order("2v1h")
            .build(Dataset::in_memory())
            .unwrap();

        let mut drir = AmbisonicsDrir::new(dataset);
        assert!(drir.is_valid());
        assert_eq!(drir.ambisonics_order().unwrap(), "2v1h");
    }

    #[test]
    fn read_only_target() {
        let dataset = Dataset::new(crate::MemoryContainer::new().read_only());
        assert!(matches!(
            DrirBuilder::new(1, 4, 1, 4).build(dataset),
            Err(Error::ReadOnly)
        ));
    }
}
