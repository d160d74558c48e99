//! Abstraction over the vendor reader driver.
//!
//! The uFCoder library exposes a handful of procedural entry points; binding
//! them behind this trait lets the rest of the crate (and its tests) work
//! against an injected capability instead of a process-wide symbol table.

/// Raw status code returned by every driver entry point. `0` is success.
pub type Status = i32;

/// The driver's success status (`UFR_OK`).
pub const UFR_OK: Status = 0;

/// Capability object for one physical reader.
pub trait Driver {
    /// Opens the connection to the reader.
    fn open(&self) -> Status;

    /// Closes the connection to the reader.
    fn close(&self) -> Status;

    /// Queries the DLogic card type of the tag in the field.
    fn card_type(&self) -> Result<u8, Status>;

    /// Sets the file number, key number and communication mode used by
    /// subsequent Type 4 Tag operations.
    fn set_file_parameters(&self, file_no: u8, key_no: u8, comm_mode: u8) -> Status;

    /// Reads a contiguous range of tag memory starting at `address`, up to
    /// `buf.len()` bytes. Returns the number of bytes the driver wrote.
    fn linear_read(
        &self,
        buf: &mut [u8],
        address: u16,
        auth_mode: u8,
        key_index: u8,
    ) -> Result<u16, Status>;

    /// Translates a status code into the driver's human-readable message.
    fn status_to_string(&self, status: Status) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Reader driver call `{op}` failed with status {status}: {message}")]
    Driver {
        op: &'static str,
        status: Status,
        message: String,
    },
}

impl Error {
    pub(crate) fn status(driver: &impl Driver, op: &'static str, status: Status) -> Self {
        Self::Driver {
            op,
            status,
            message: driver.status_to_string(status),
        }
    }
}
