//! Scoped access to the physical reader.
//!
//! Opening the reader yields a [`ReaderSession`] that closes it again when
//! dropped, whether the run succeeded or failed partway. At most one session
//! exists per run; the session borrows the driver, so it cannot outlive it.

use tracing::{debug, warn};

use crate::driver::{Driver, Error, Status, UFR_OK};
use crate::ndef::{ReadBuffer, READ_CAPACITY};

/// File number of the well-known NDEF file on a Type 4 Tag.
const NDEF_FILE_NO: u8 = 2;

/// Key number granting read access to the NDEF file.
const NDEF_READ_KEY_NO: u8 = 0x0E;

/// Plain (unencrypted) communication mode.
const COMM_MODE_PLAIN: u8 = 0;

/// Linear reads start at the beginning of tag memory.
const READ_ADDRESS: u16 = 0;

/// Type 4 Tag authentication mode for reading without a password.
const T4T_WITHOUT_PWD_AUTH: u8 = 0x60;

/// Reader-side key index used for the read.
const READER_KEY_INDEX: u8 = 0;

/// An open connection to the reader. Closed on drop, exactly once.
pub struct ReaderSession<'a, D: Driver> {
    driver: &'a D,
}

impl<'a, D: Driver> ReaderSession<'a, D> {
    /// Opens the reader. A non-zero driver status is terminal; no retry.
    pub fn open(driver: &'a D) -> Result<Self, Error> {
        match driver.open() {
            UFR_OK => Ok(Self { driver }),
            status => Err(Error::status(driver, "open", status)),
        }
    }

    /// Queries the card type of the tag in the field, best effort.
    pub fn card_type(&self) -> Option<u8> {
        self.driver.card_type().ok()
    }

    /// Points subsequent Type 4 Tag operations at the NDEF file, read key,
    /// plain communication. Protocol constants for this tag family.
    pub fn configure_ndef(&self) -> Result<(), Error> {
        self.check(
            "set_file_parameters",
            self.driver
                .set_file_parameters(NDEF_FILE_NO, NDEF_READ_KEY_NO, COMM_MODE_PLAIN),
        )
    }

    /// Reads up to [`READ_CAPACITY`] bytes of tag memory from address 0,
    /// without password authentication.
    pub fn read_ndef(&self) -> Result<ReadBuffer, Error> {
        let mut data = [0u8; READ_CAPACITY];

        match self.driver.linear_read(
            &mut data,
            READ_ADDRESS,
            T4T_WITHOUT_PWD_AUTH,
            READER_KEY_INDEX,
        ) {
            Ok(len) => {
                let buf = ReadBuffer::new(data, len);
                debug!("RX: {}", hex::encode(buf.bytes()));

                Ok(buf)
            }
            Err(status) => Err(Error::status(self.driver, "linear_read", status)),
        }
    }

    fn check(&self, op: &'static str, status: Status) -> Result<(), Error> {
        match status {
            UFR_OK => Ok(()),
            status => Err(Error::status(self.driver, op, status)),
        }
    }
}

impl<'a, D: Driver> Drop for ReaderSession<'a, D> {
    fn drop(&mut self) {
        match self.driver.close() {
            UFR_OK => debug!("Reader closed"),
            status => warn!(
                "Failed to close the reader: {}",
                self.driver.status_to_string(status)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::ndef;

    /// Scriptable driver recording the entry points the session touched.
    struct FakeDriver {
        open_status: Status,
        configure_status: Status,
        read_status: Status,
        payload: Vec<u8>,
        calls: RefCell<Vec<&'static str>>,
        closes: Cell<u32>,
    }

    impl FakeDriver {
        fn ok_with_url(url: &str) -> Self {
            let mut payload = vec![0x00, 0x00, 0xD1, 0x01];
            payload.push((url.len() + 1) as u8);
            payload.push(0x55);
            payload.push(0x00);
            payload.extend_from_slice(url.as_bytes());

            Self {
                open_status: UFR_OK,
                configure_status: UFR_OK,
                read_status: UFR_OK,
                payload,
                calls: RefCell::new(Vec::new()),
                closes: Cell::new(0),
            }
        }

        fn failing(op: &str, status: Status) -> Self {
            let mut fake = Self::ok_with_url("https://example.com");
            match op {
                "open" => fake.open_status = status,
                "configure" => fake.configure_status = status,
                "read" => fake.read_status = status,
                other => panic!("unknown op {other}"),
            }
            fake
        }
    }

    impl Driver for FakeDriver {
        fn open(&self) -> Status {
            self.calls.borrow_mut().push("open");
            self.open_status
        }

        fn close(&self) -> Status {
            self.calls.borrow_mut().push("close");
            self.closes.set(self.closes.get() + 1);
            UFR_OK
        }

        fn card_type(&self) -> Result<u8, Status> {
            Ok(0x45)
        }

        fn set_file_parameters(&self, file_no: u8, key_no: u8, comm_mode: u8) -> Status {
            self.calls.borrow_mut().push("set_file_parameters");
            assert_eq!((2, 0x0E, 0), (file_no, key_no, comm_mode));
            self.configure_status
        }

        fn linear_read(
            &self,
            buf: &mut [u8],
            address: u16,
            auth_mode: u8,
            key_index: u8,
        ) -> Result<u16, Status> {
            self.calls.borrow_mut().push("linear_read");
            assert_eq!((0, 0x60, 0), (address, auth_mode, key_index));

            match self.read_status {
                UFR_OK => {
                    buf[..self.payload.len()].copy_from_slice(&self.payload);
                    Ok(buf.len() as u16)
                }
                status => Err(status),
            }
        }

        fn status_to_string(&self, status: Status) -> String {
            format!("UFR_STATUS_{status}")
        }
    }

    /// The whole read sequence against a well-behaved driver.
    fn run(driver: &FakeDriver) -> Result<String, Error> {
        let session = ReaderSession::open(driver)?;
        session.configure_ndef()?;
        let buf = session.read_ndef()?;

        Ok(ndef::parse_url(&buf).expect("fake driver produced a well-formed buffer"))
    }

    #[test]
    fn reads_a_url_and_closes_once() {
        let driver = FakeDriver::ok_with_url("https://example.com/tap");

        assert_eq!("https://example.com/tap", run(&driver).unwrap());
        assert_eq!(1, driver.closes.get());
        assert_eq!(
            vec!["open", "set_file_parameters", "linear_read", "close"],
            *driver.calls.borrow(),
        );
    }

    #[test]
    fn failed_open_never_closes() {
        let driver = FakeDriver::failing("open", 3);

        let err = run(&driver).unwrap_err();
        assert!(err.to_string().contains("UFR_STATUS_3"));
        assert_eq!(0, driver.closes.get());
    }

    #[test]
    fn failed_configure_still_closes_once() {
        let driver = FakeDriver::failing("configure", 8);

        let err = run(&driver).unwrap_err();
        assert!(err.to_string().contains("set_file_parameters"));
        assert_eq!(1, driver.closes.get());
        assert!(!driver.calls.borrow().contains(&"linear_read"));
    }

    #[test]
    fn failed_read_still_closes_once() {
        let driver = FakeDriver::failing("read", 0x08);

        run(&driver).unwrap_err();
        assert_eq!(1, driver.closes.get());
    }
}
