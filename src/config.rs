//! Host and path configuration for the migration workflow.
//!
//! Both types exist so the preflight pipeline can be exercised against a
//! temporary directory and synthetic host facts instead of the live
//! system.

use camino::Utf8PathBuf;

/// Filesystem locations of the apt source configuration.
#[derive(Debug, Clone)]
pub struct AptPaths {
    /// The primary package-source file, read, backed up and overwritten.
    pub sources_list: Utf8PathBuf,
    /// The secondary source-list directory, enumerated read-only.
    pub sources_list_d: Utf8PathBuf,
}

impl Default for AptPaths {
    fn default() -> Self {
        Self {
            sources_list: Utf8PathBuf::from("/etc/apt/sources.list"),
            sources_list_d: Utf8PathBuf::from("/etc/apt/sources.list.d"),
        }
    }
}

/// Facts about the calling process and host, gathered once at startup.
#[derive(Debug, Clone)]
pub struct HostFacts {
    /// Operating system name as reported by the platform
    /// (`std::env::consts::OS`).
    pub os: String,
    /// Effective uid of the calling process.
    pub euid: u32,
}

impl HostFacts {
    /// Gathers facts from the live host.
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            euid: rustix::process::geteuid().as_raw(),
        }
    }
}
