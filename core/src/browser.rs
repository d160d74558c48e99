//! Mapping from platform and browser preference to a concrete launch
//! command, and fire-and-forget spawning of that command.

use std::fmt;
use std::io;
use std::process::{Command, Stdio};

use tracing::{debug, error};

/// The operating systems the launch table distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    /// Linux, the BSDs, and anything else with `xdg-open`.
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }
}

/// Browser preference. Anything unrecognized means Firefox.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    #[default]
    Firefox,
}

impl From<&str> for Browser {
    fn from(name: &str) -> Self {
        match name {
            "chrome" => Self::Chrome,
            _ => Self::Firefox,
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
        })
    }
}

/// A resolved browser launch command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchTarget {
    pub command: String,
    pub args: Vec<String>,
}

impl LaunchTarget {
    fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
        }
    }
}

/// Resolves the launch command for a platform, preference and URL.
/// Pure: identical inputs always yield the identical target.
pub fn resolve(platform: Platform, browser: Browser, url: &str) -> LaunchTarget {
    match (platform, browser) {
        (Platform::MacOs, Browser::Chrome) => {
            LaunchTarget::new("open", &["-a", "Google Chrome", url])
        }
        (Platform::MacOs, Browser::Firefox) => LaunchTarget::new("open", &["-a", "Firefox", url]),
        (Platform::Windows, Browser::Chrome) => {
            LaunchTarget::new("cmd", &["/c", "start", "", "chrome", url])
        }
        (Platform::Windows, Browser::Firefox) => {
            LaunchTarget::new("cmd", &["/c", "start", "", "firefox", url])
        }
        (Platform::Other, Browser::Chrome) => LaunchTarget::new("google-chrome", &[url]),
        (Platform::Other, Browser::Firefox) => LaunchTarget::new("firefox", &[url]),
    }
}

/// Process-spawning seam so tests can observe launch attempts.
pub trait Spawner {
    fn spawn(&self, target: &LaunchTarget) -> io::Result<()>;
}

/// Spawns through [`std::process::Command`], detached: stdio discarded and
/// the child never waited on.
pub struct ProcessSpawner;

impl Spawner for ProcessSpawner {
    fn spawn(&self, target: &LaunchTarget) -> io::Result<()> {
        Command::new(&target.command)
            .args(&target.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

/// Launches the browser for `url`. A spawn failure on a platform with a
/// generic opener gets exactly one `xdg-open` retry; on macOS and Windows
/// the failure is logged and swallowed.
pub fn launch(platform: Platform, browser: Browser, url: &str, spawner: &impl Spawner) {
    let target = resolve(platform, browser, url);
    debug!("Launching {} {:?}", target.command, target.args);

    if let Err(e) = spawner.spawn(&target) {
        error!("Error opening browser: {e}");

        if platform == Platform::Other {
            let fallback = LaunchTarget::new("xdg-open", &[url]);
            if let Err(e) = spawner.spawn(&fallback) {
                error!("Error opening browser via xdg-open: {e}");
            }
        }
    }
}
