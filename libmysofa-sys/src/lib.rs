#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::os::raw::{c_char, c_int, c_uint};

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct MYSOFA_ATTRIBUTE {
    pub next: *mut MYSOFA_ATTRIBUTE,
    pub name: *mut c_char,
    pub value: *mut c_char,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct MYSOFA_ARRAY {
    pub values: *mut f32,
    pub elements: c_uint,
    pub attributes: *mut MYSOFA_ATTRIBUTE,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct MYSOFA_VARIABLE {
    pub next: *mut MYSOFA_VARIABLE,
    pub name: *mut c_char,
    pub value: *mut MYSOFA_ARRAY,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct MYSOFA_HRTF {
    pub I: c_uint,
    pub C: c_uint,
    pub R: c_uint,
    pub E: c_uint,
    pub N: c_uint,
    pub M: c_uint,

    pub ListenerPosition: MYSOFA_ARRAY,
    pub ReceiverPosition: MYSOFA_ARRAY,
    pub SourcePosition: MYSOFA_ARRAY,
    pub EmitterPosition: MYSOFA_ARRAY,
    pub ListenerUp: MYSOFA_ARRAY,
    pub ListenerView: MYSOFA_ARRAY,
    pub DataIR: MYSOFA_ARRAY,
    pub DataSamplingRate: MYSOFA_ARRAY,
    pub DataDelay: MYSOFA_ARRAY,
    pub attributes: *mut MYSOFA_ATTRIBUTE,
    pub variables: *mut MYSOFA_VARIABLE,
}

pub const MYSOFA_OK: c_int = 0;
pub const MYSOFA_INTERNAL_ERROR: c_int = -1;
pub const MYSOFA_INVALID_FORMAT: c_int = 10000;
pub const MYSOFA_UNSUPPORTED_FORMAT: c_int = 10001;
pub const MYSOFA_NO_MEMORY: c_int = 10002;
pub const MYSOFA_READ_ERROR: c_int = 10003;
pub const MYSOFA_INVALID_ATTRIBUTES: c_int = 10004;
pub const MYSOFA_INVALID_DIMENSIONS: c_int = 10005;
pub const MYSOFA_INVALID_DIMENSION_LIST: c_int = 10006;

extern "C" {
    pub fn mysofa_load(filename: *const c_char, err: *mut c_int) -> *mut MYSOFA_HRTF;
    pub fn mysofa_free(hrtf: *mut MYSOFA_HRTF);
    pub fn mysofa_getversion(major: *mut c_int, minor: *mut c_int, patch: *mut c_int);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_version() {
        let (mut major, mut minor, mut patch) = (0, 0, 0);
        unsafe { mysofa_getversion(&mut major, &mut minor, &mut patch) };
        assert!(major >= 1);
    }
}
