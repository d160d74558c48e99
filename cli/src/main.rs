use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use taptag::browser::{self, Browser, Platform, ProcessSpawner};
use taptag::{driver, ndef, ufr, ReaderSession};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Failed to load the reader driver: {0}")]
    Load(#[from] ufr::LoadError),

    #[error("Error occurred on communicating with the reader: {0}")]
    Reader(#[from] driver::Error),

    #[error("The tag does not carry a well-formed NDEF URL: {0}")]
    Ndef(#[from] ndef::ParseError),
}

type Result<T> = std::result::Result<T, Error>;

/// Reads a URL from an SDM-enabled NFC tag and opens it in a local browser.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Browser to open the URL with; anything other than "chrome" means firefox.
    browser: Option<String>,

    /// Path to the uFCoder shared library, if not at the default location.
    #[arg(long)]
    lib: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let browser = args.browser.as_deref().map(Browser::from).unwrap_or_default();

    let driver = ufr::UfrDriver::load(args.lib.as_deref())?;
    let session = ReaderSession::open(&driver)?;
    info!("Reader opened successfully");

    if let Some(card_type) = session.card_type() {
        debug!("Card type: 0x{card_type:02X}");
    }

    session.configure_ndef()?;
    let url = ndef::parse_url(&session.read_ndef()?)?;

    info!("Opening URL: {url}");
    info!("Using browser: {browser}");

    browser::launch(Platform::current(), browser, &url, &ProcessSpawner);

    Ok(())
}
