//! A crate to read a URL from an SDM-enabled NFC tag through a reader driver delegate.

#[cfg(feature = "ufr")]
pub mod ufr;

pub mod browser;
pub mod driver;
pub mod ndef;
pub mod session;

pub use session::ReaderSession;
