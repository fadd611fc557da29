use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::LauncherError;

/// Operating systems known to version descriptors, named the way the
/// descriptor rules name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Windows,
    Osx,
    Linux,
}

impl TargetOs {
    /// The OS this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::Osx
        } else {
            TargetOs::Linux
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetOs::Windows => "windows",
            TargetOs::Osx => "osx",
            TargetOs::Linux => "linux",
        }
    }

    /// The single platform-specific JVM flag every launch carries.
    pub fn jvm_flag(self) -> &'static str {
        match self {
            TargetOs::Windows => {
                "-XX:HeapDumpPath=MojangTricksIntelDriversForPerformance_javaw.exe_minecraft.exe.heapdump"
            }
            TargetOs::Osx => "-XstartOnFirstThread",
            TargetOs::Linux => "-Xss1M",
        }
    }

    pub fn classpath_separator(self) -> &'static str {
        match self {
            TargetOs::Windows => ";",
            TargetOs::Osx | TargetOs::Linux => ":",
        }
    }

    /// Classifier key used by descriptors that omit the `natives` map.
    pub fn native_classifier(self) -> String {
        format!("natives-{}", self.as_str())
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetOs {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "windows" => Ok(TargetOs::Windows),
            "osx" => Ok(TargetOs::Osx),
            "linux" => Ok(TargetOs::Linux),
            other => Err(LauncherError::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// `${arch}` value used in native classifier templates.
pub fn arch_bits() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "64"
    } else {
        "32"
    }
}
