use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error")]
    Io(#[from] io::Error),
    #[error("The owls are not what they seem")]
    InternalError,
    #[error("Attribute `{key}` not found on {scope}")]
    AttributeNotFound { scope: String, key: String },
    #[error("Dimension `{0}` not found")]
    DimensionNotFound(String),
    #[error("Variable `{0}` not found")]
    VariableNotFound(String),
    #[error("Attribute `{key}` on {scope} is not a {expected}")]
    TypeMismatch {
        scope: String,
        key: String,
        expected: &'static str,
    },
    #[error("Variable `{variable}` has shape {found:?}, expected {expected}")]
    ShapeMismatch {
        variable: String,
        expected: String,
        found: Vec<usize>,
    },
    #[error("Variable `{variable}` holds {expected} values, buffer has {found}")]
    LengthMismatch {
        variable: String,
        expected: usize,
        found: usize,
    },
    #[error("`{0}` is already declared")]
    AlreadyExists(String),
    #[error("Dataset is read-only")]
    ReadOnly,
    #[error("Missing required variable `{0}`")]
    MissingRequiredVariable(String),
    #[error("`{token}` is not a valid {vocabulary} token")]
    InvalidEnumToken {
        vocabulary: &'static str,
        token: String,
    },
    #[error("Dataset must be validated before calling `{0}`")]
    PreconditionViolation(&'static str),
    #[error("Invalid dimension `{name}` = {size}, expected {expected}")]
    InvalidDimension {
        name: String,
        size: usize,
        expected: &'static str,
    },
    #[error("Attribute `{key}` is `{found}`, expected {expected}")]
    InvalidAttributeValue {
        key: String,
        expected: String,
        found: String,
    },
    #[error("Variable `{variable}` has invalid coordinate type `{found}`")]
    InvalidCoordinateType { variable: String, found: String },
    #[error("Invalid positions at line {line}: {reason}")]
    InvalidPositions { line: usize, reason: String },
}

#[cfg(feature = "mysofa")]
impl Error {
    pub(crate) fn from_raw(err: i32) -> Error {
        use Error::*;

        match err {
            ffi::MYSOFA_INVALID_FORMAT | ffi::MYSOFA_UNSUPPORTED_FORMAT => {
                Io(io::Error::new(io::ErrorKind::InvalidData, "Not a SOFA file"))
            }
            ffi::MYSOFA_INVALID_ATTRIBUTES => InvalidAttributeValue {
                key: "Conventions".into(),
                expected: "SOFA".into(),
                found: String::new(),
            },
            ffi::MYSOFA_INVALID_DIMENSIONS | ffi::MYSOFA_INVALID_DIMENSION_LIST => {
                Io(io::Error::new(io::ErrorKind::InvalidData, "Invalid dimensions"))
            }
            ffi::MYSOFA_READ_ERROR => Io(io::Error::new(
                io::ErrorKind::NotFound,
                "Unable to read from file",
            )),
            ffi::MYSOFA_NO_MEMORY => Io(io::Error::new(
                io::ErrorKind::OutOfMemory,
                "Ran out of memory",
            )),
            _ => InternalError,
        }
    }
}
