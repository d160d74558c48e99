//! uFCoder backend for the reader driver abstraction.
//! Can be enabled by turning the `ufr` feature on.
//!
//! ## What is uFCoder?
//! uFCoder is the vendor library shipped by DLogic for their uFR series of
//! NFC readers. It is distributed as a prebuilt shared library exposing a
//! flat procedural API; there is no stable system-wide install location, so
//! this module loads it at runtime from a caller-supplied path or from the
//! platform's conventional file name next to the executable.
//!
//! All FFI stays inside this module; the rest of the crate sees the library
//! only through [`Driver`].

use std::ffi::{c_char, CStr};
use std::path::Path;

use libloading::{Library, Symbol};

use crate::driver::{Driver, Status, UFR_OK};

const DEFAULT_LIB_WINDOWS: &str = "uFCoder.dll";
const DEFAULT_LIB_MACOS: &str = "libuFCoder.dylib";
const DEFAULT_LIB_OTHER: &str = "./libuFCoder-x86_64.so";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to load the uFCoder library: {0}")]
    Library(#[source] libloading::Error),

    #[error("The uFCoder library does not export `{name}`: {source}")]
    Symbol {
        name: &'static str,
        source: libloading::Error,
    },
}

/// The uFCoder entry points, resolved once at load time.
///
/// The function pointers stay valid for as long as `_lib` is alive, which
/// the struct guarantees by owning it.
pub struct UfrDriver {
    _lib: Library,
    reader_open: unsafe extern "C" fn() -> Status,
    reader_close: unsafe extern "C" fn() -> Status,
    get_dlogic_card_type: unsafe extern "C" fn(*mut u8) -> u8,
    nt4h_set_global_parameters: unsafe extern "C" fn(u8, u8, u8) -> Status,
    linear_read: unsafe extern "C" fn(*mut u8, u16, u16, *mut u16, u8, u8) -> Status,
    ufr_status2string: unsafe extern "C" fn(Status) -> *const c_char,
}

impl UfrDriver {
    /// Loads the vendor library and resolves every entry point, so a broken
    /// or mismatched library fails here rather than mid-sequence.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let path = path.unwrap_or_else(|| Path::new(default_library_name()));

        // SAFETY: loading the vendor driver runs its initializers; the
        // library is trusted to the same degree as the process itself.
        let lib = unsafe { Library::new(path) }.map_err(LoadError::Library)?;

        let reader_open: unsafe extern "C" fn() -> Status = *symbol(&lib, "ReaderOpen")?;
        let reader_close: unsafe extern "C" fn() -> Status = *symbol(&lib, "ReaderClose")?;
        let get_dlogic_card_type: unsafe extern "C" fn(*mut u8) -> u8 =
            *symbol(&lib, "GetDlogicCardType")?;
        let nt4h_set_global_parameters: unsafe extern "C" fn(u8, u8, u8) -> Status =
            *symbol(&lib, "nt4h_set_global_parameters")?;
        let linear_read: unsafe extern "C" fn(*mut u8, u16, u16, *mut u16, u8, u8) -> Status =
            *symbol(&lib, "LinearRead")?;
        let ufr_status2string: unsafe extern "C" fn(Status) -> *const c_char =
            *symbol(&lib, "UFR_Status2String")?;

        Ok(Self {
            _lib: lib,
            reader_open,
            reader_close,
            get_dlogic_card_type,
            nt4h_set_global_parameters,
            linear_read,
            ufr_status2string,
        })
    }
}

fn symbol<'l, T>(lib: &'l Library, name: &'static str) -> Result<Symbol<'l, T>, LoadError> {
    // SAFETY: the signature `T` is taken from the vendor's published API.
    unsafe { lib.get(name.as_bytes()) }.map_err(|source| LoadError::Symbol { name, source })
}

impl Driver for UfrDriver {
    fn open(&self) -> Status {
        unsafe { (self.reader_open)() }
    }

    fn close(&self) -> Status {
        unsafe { (self.reader_close)() }
    }

    fn card_type(&self) -> Result<u8, Status> {
        let mut card_type = 0u8;
        let status = unsafe { (self.get_dlogic_card_type)(&mut card_type) };

        match Status::from(status) {
            UFR_OK => Ok(card_type),
            status => Err(status),
        }
    }

    fn set_file_parameters(&self, file_no: u8, key_no: u8, comm_mode: u8) -> Status {
        unsafe { (self.nt4h_set_global_parameters)(file_no, key_no, comm_mode) }
    }

    fn linear_read(
        &self,
        buf: &mut [u8],
        address: u16,
        auth_mode: u8,
        key_index: u8,
    ) -> Result<u16, Status> {
        let mut returned = 0u16;

        // SAFETY: the driver writes at most `buf.len()` bytes into `buf`
        // and reports the count through `returned`.
        let status = unsafe {
            (self.linear_read)(
                buf.as_mut_ptr(),
                address,
                buf.len() as u16,
                &mut returned,
                auth_mode,
                key_index,
            )
        };

        match status {
            UFR_OK => Ok(returned),
            status => Err(status),
        }
    }

    fn status_to_string(&self, status: Status) -> String {
        let ptr = unsafe { (self.ufr_status2string)(status) };
        if ptr.is_null() {
            return format!("unknown status {status}");
        }

        // SAFETY: the driver returns a pointer to a static NUL-terminated
        // message table entry.
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}

fn default_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        DEFAULT_LIB_WINDOWS
    } else if cfg!(target_os = "macos") {
        DEFAULT_LIB_MACOS
    } else {
        DEFAULT_LIB_OTHER
    }
}
