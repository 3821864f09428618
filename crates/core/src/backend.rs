use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configured transport family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Smtp,
    Ses,
    Stream,
}

/// A driver name with no implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("driver '{0}' is not implemented or supported")]
pub struct UnknownDriver(pub String);

impl FromStr for Driver {
    type Err = UnknownDriver;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smtp" => Ok(Self::Smtp),
            "ses" => Ok(Self::Ses),
            "stream" => Ok(Self::Stream),
            other => Err(UnknownDriver(other.to_owned())),
        }
    }
}

impl Driver {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Smtp => "smtp",
            Self::Ses => "ses",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime class the process is executing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    /// A full runtime with native sockets and the AWS SDK.
    Native,
    /// A constrained edge isolate without general-purpose networking.
    Edge,
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Native => "native",
            Self::Edge => "edge",
        })
    }
}

/// A concrete send implementation bound to one (driver, runtime) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    SmtpNative,
    SmtpEdge,
    SesNative,
    SesEdge,
    Stream,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        Self::SmtpNative,
        Self::SmtpEdge,
        Self::SesNative,
        Self::SesEdge,
        Self::Stream,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SmtpNative => "smtp-native",
            Self::SmtpEdge => "smtp-edge",
            Self::SesNative => "ses-native",
            Self::SesEdge => "ses-edge",
            Self::Stream => "stream",
        }
    }

    /// The driver this backend belongs to.
    pub fn driver(self) -> Driver {
        match self {
            Self::SmtpNative | Self::SmtpEdge => Driver::Smtp,
            Self::SesNative | Self::SesEdge => Driver::Ses,
            Self::Stream => Driver::Stream,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
