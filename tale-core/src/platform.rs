//! Host platform identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Desktop platform family the library is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Mac,
    /// Linux and other freedesktop hosts.
    Xdg,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Xdg
        }
    }

    /// Short platform tag (`windows`, `mac` or `xdg`).
    pub fn tag(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Mac => "mac",
            Platform::Xdg => "xdg",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "windows" => Some(Platform::Windows),
            "mac" => Some(Platform::Mac),
            "xdg" => Some(Platform::Xdg),
            _ => None,
        }
    }

    /// What users call the file browser on this platform.
    pub fn file_manager_name(&self) -> &'static str {
        match self {
            Platform::Windows => "File Explorer",
            Platform::Mac => "Finder",
            Platform::Xdg => "File Manager",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for platform in [Platform::Windows, Platform::Mac, Platform::Xdg] {
            assert_eq!(Platform::from_tag(platform.tag()), Some(platform));
        }
        assert_eq!(Platform::from_tag("beos"), None);
    }

    #[test]
    fn test_file_manager_names() {
        assert_eq!(Platform::Mac.file_manager_name(), "Finder");
        assert_eq!(Platform::Xdg.file_manager_name(), "File Manager");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_current_on_linux() {
        assert_eq!(Platform::current(), Platform::Xdg);
    }
}
