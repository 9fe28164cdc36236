//! How this client presents itself to the transport, and at what verbosity
//! the transport should log.

use serde::{Deserialize, Serialize};

/// Browser the client claims to be when pairing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserName {
    #[default]
    Chrome,
    Firefox,
    Safari,
    Edge,
    Opera,
    Desktop,
}

impl BrowserName {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Chrome => "Chrome",
            Self::Firefox => "Firefox",
            Self::Safari => "Safari",
            Self::Edge => "Edge",
            Self::Opera => "Opera",
            Self::Desktop => "Desktop",
        }
    }
}

/// `[platform, browser, version]` triple advertised to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub platform: String,
    pub browser: String,
    pub version: String,
}

impl ClientIdentity {
    /// Identity appropriate for the host OS (`Mac OS`, `Windows`, else `Ubuntu`).
    pub fn appropriate(browser: BrowserName) -> Self {
        Self {
            platform: platform_name(std::env::consts::OS).to_owned(),
            browser: browser.display_name().to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }

    pub fn as_triple(&self) -> [&str; 3] {
        [&self.platform, &self.browser, &self.version]
    }
}

fn platform_name(os: &str) -> &'static str {
    match os {
        "macos" => "Mac OS",
        "windows" => "Windows",
        _ => "Ubuntu",
    }
}

/// Log verbosity handed to the transport collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Fatal,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
    Silent,
}
