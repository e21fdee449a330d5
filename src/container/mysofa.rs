use std::ffi::{CStr, CString};
use std::path::Path;

use super::{missing_variable, AttributeValue, Container, ElementType, Scope};
use crate::{Error, Result};

/// Read-only view of a SOFA file loaded by libmysofa.
///
/// libmysofa keeps every value as `f32`; they are widened on read.
pub struct SofaFile {
    raw: *mut ffi::MYSOFA_HRTF,
}

impl SofaFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SofaFile> {
        let path = cstr(path.as_ref())?;
        let mut err = 0;

        let raw = unsafe { ffi::mysofa_load(path.as_ptr(), &mut err) };

        if raw.is_null() || err != ffi::MYSOFA_OK {
            if !raw.is_null() {
                unsafe { ffi::mysofa_free(raw) };
            }
            return Err(Error::from_raw(err));
        }

        let file = SofaFile { raw };
        let hrtf = file.hrtf();
        log::debug!(
            "loaded {:?}: I={} C={} R={} E={} N={} M={}",
            path,
            hrtf.I,
            hrtf.C,
            hrtf.R,
            hrtf.E,
            hrtf.N,
            hrtf.M
        );

        Ok(file)
    }

    fn hrtf(&self) -> &ffi::MYSOFA_HRTF {
        unsafe { &*self.raw }
    }

    fn array(&self, name: &str) -> Option<&ffi::MYSOFA_ARRAY> {
        let hrtf = self.hrtf();

        let array = match name {
            "ListenerPosition" => &hrtf.ListenerPosition,
            "ReceiverPosition" => &hrtf.ReceiverPosition,
            "SourcePosition" => &hrtf.SourcePosition,
            "EmitterPosition" => &hrtf.EmitterPosition,
            "ListenerUp" => &hrtf.ListenerUp,
            "ListenerView" => &hrtf.ListenerView,
            "Data.IR" => &hrtf.DataIR,
            "Data.SamplingRate" => &hrtf.DataSamplingRate,
            "Data.Delay" => &hrtf.DataDelay,
            _ => return self.user_variable(name),
        };

        // fixed slots stay zeroed when the file does not declare them
        (!array.attributes.is_null() || !array.values.is_null()).then_some(array)
    }

    fn user_variable(&self, name: &str) -> Option<&ffi::MYSOFA_ARRAY> {
        let mut node = self.hrtf().variables;

        while let Some(variable) = unsafe { node.as_ref() } {
            if !variable.name.is_null()
                && unsafe { CStr::from_ptr(variable.name) }.to_bytes() == name.as_bytes()
            {
                return unsafe { variable.value.as_ref() };
            }
            node = variable.next;
        }

        None
    }

    fn attributes(&self, scope: Scope<'_>) -> Option<*mut ffi::MYSOFA_ATTRIBUTE> {
        match scope {
            Scope::Global => Some(self.hrtf().attributes),
            Scope::Variable(name) => self.array(name).map(|array| array.attributes),
        }
    }

    fn find_attribute(&self, mut node: *mut ffi::MYSOFA_ATTRIBUTE, key: &str) -> Option<&CStr> {
        while let Some(attribute) = unsafe { node.as_ref() } {
            if !attribute.name.is_null()
                && !attribute.value.is_null()
                && unsafe { CStr::from_ptr(attribute.name) }.to_bytes() == key.as_bytes()
            {
                return Some(unsafe { CStr::from_ptr(attribute.value) });
            }
            node = attribute.next;
        }

        None
    }
}

impl Container for SofaFile {
    fn is_writable(&self) -> bool {
        false
    }

    fn dimension(&self, name: &str) -> Option<usize> {
        let hrtf = self.hrtf();

        let size = match name {
            "I" => hrtf.I,
            "C" => hrtf.C,
            "R" => hrtf.R,
            "E" => hrtf.E,
            "N" => hrtf.N,
            "M" => hrtf.M,
            _ => return None,
        };

        Some(size as usize)
    }

    fn add_dimension(&mut self, _name: &str, _size: usize) -> Result<()> {
        Err(Error::ReadOnly)
    }

    fn variable_dimensions(&self, name: &str) -> Option<Vec<String>> {
        let array = self.array(name)?;
        let list = self.find_attribute(array.attributes, "DIMENSION_LIST")?;

        Some(
            list.to_string_lossy()
                .split(',')
                .map(|dim| dim.trim().to_owned())
                .filter(|dim| !dim.is_empty())
                .collect(),
        )
    }

    fn add_variable(
        &mut self,
        _name: &str,
        _element_type: ElementType,
        _dims: &[&str],
    ) -> Result<()> {
        Err(Error::ReadOnly)
    }

    fn attribute(&self, scope: Scope<'_>, key: &str) -> Option<AttributeValue> {
        let head = self.attributes(scope)?;
        self.find_attribute(head, key)
            .map(|value| AttributeValue::Char(value.to_bytes().to_vec()))
    }

    fn put_attribute(
        &mut self,
        _scope: Scope<'_>,
        _key: &str,
        _value: AttributeValue,
    ) -> Result<()> {
        Err(Error::ReadOnly)
    }

    fn read_values(&self, name: &str) -> Result<Vec<f64>> {
        let array = self.array(name).ok_or_else(|| missing_variable(name))?;

        if array.values.is_null() {
            return Ok(Vec::new());
        }

        let values = unsafe { std::slice::from_raw_parts(array.values, array.elements as usize) };
        Ok(values.iter().copied().map(f64::from).collect())
    }

    fn write_values(&mut self, _name: &str, _start: usize, _values: &[f64]) -> Result<()> {
        Err(Error::ReadOnly)
    }

    fn set_fill(&mut self, _name: &str, _fill: Option<f64>) -> Result<()> {
        Err(Error::ReadOnly)
    }
}

impl Drop for SofaFile {
    fn drop(&mut self) {
        unsafe { ffi::mysofa_free(self.raw) };
    }
}

unsafe impl Send for SofaFile {}
unsafe impl Sync for SofaFile {}

#[cfg(unix)]
fn cstr(path: &Path) -> std::io::Result<CString> {
    use std::os::unix::ffi::OsStrExt;
    Ok(CString::new(path.as_os_str().as_bytes())?)
}

#[cfg(not(unix))]
fn cstr(path: &Path) -> std::io::Result<CString> {
    let path = path.to_str().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path is not valid UTF-8")
    })?;
    Ok(CString::new(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AmbisonicsDrir, Dataset};

    const TESTER: &str = "libmysofa-sys/libmysofa/tests/tester.sofa";

    #[test]
    fn open_missing_file() {
        assert!(SofaFile::open("does/not/exist.sofa").is_err());
    }

    #[test]
    fn tester_file_is_read_only() {
        let mut dataset = Dataset::new(SofaFile::open(TESTER).unwrap());

        assert!(!dataset.is_writable());
        assert!(dataset.dimension("M").is_some());
        assert_eq!(dataset.dimension("C"), Some(3));
        assert_eq!(
            dataset.global_attribute_as_string("Conventions").unwrap(),
            "SOFA"
        );

        let position = dataset.require_variable("SourcePosition").unwrap();
        let m = dataset.dimension("M").unwrap();
        assert_eq!(position.shape(), vec![m, 3]);
        assert_eq!(dataset.values(&position).unwrap().len(), m * 3);

        assert!(matches!(dataset.add_dimension("X", 1), Err(Error::ReadOnly)));
    }

    #[test]
    fn hrir_file_is_not_a_drir() {
        assert!(AmbisonicsDrir::open(TESTER).is_err());

        let mut drir = AmbisonicsDrir::new(Dataset::new(SofaFile::open(TESTER).unwrap()));
        assert!(!drir.is_valid());
    }
}
