//! Source-configuration migration.
//!
//! Backs up the primary apt sources file, then replaces it with the fixed
//! devel-series template. The backup must land on disk before the primary
//! file is touched; the replacement itself is a write-to-temp plus rename
//! so a crash mid-write cannot leave a truncated sources file behind.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::error::RhinoError;

/// File mode for the backup and the new sources file: owner read/write,
/// group and other read.
const SOURCES_MODE: u32 = 0o644;

/// The devel-series sources template, written byte-for-byte with no
/// substitution points. Identical across runs.
pub const DEVEL_SOURCES: &str = "\
# See http://help.ubuntu.com/community/UpgradeNotes for how to upgrade to
# newer versions of the distribution.
deb http://archive.ubuntu.com/ubuntu devel main restricted
# deb-src http://archive.ubuntu.com/ubuntu devel main restricted
## Major bug fix updates produced after the final release of the
## distribution.
deb http://archive.ubuntu.com/ubuntu devel-updates main restricted
# deb-src http://archive.ubuntu.com/ubuntu devel-updates main restricted
## N.B. software from this repository is ENTIRELY UNSUPPORTED by the Ubuntu
## team. Also, please note that software in universe WILL NOT receive any
## review or updates from the Ubuntu security team.
deb http://archive.ubuntu.com/ubuntu devel universe
# deb-src http://archive.ubuntu.com/ubuntu devel universe
deb http://archive.ubuntu.com/ubuntu devel-updates universe
# deb-src http://archive.ubuntu.com/ubuntu devel-updates universe
## N.B. software from this repository is ENTIRELY UNSUPPORTED by the Ubuntu
## team, and may not be under a free licence. Please satisfy yourself as to
## your rights to use the software. Also, please note that software in
## multiverse WILL NOT receive any review or updates from the Ubuntu
## security team.
deb http://archive.ubuntu.com/ubuntu devel multiverse
# deb-src http://archive.ubuntu.com/ubuntu devel multiverse
deb http://archive.ubuntu.com/ubuntu devel-updates multiverse
# deb-src http://archive.ubuntu.com/ubuntu devel-updates multiverse
## N.B. software from this repository may not have been tested as
## extensively as that contained in the main release, although it includes
## newer versions of some applications which may provide useful features.
## Also, please note that software in backports WILL NOT receive any review
## or updates from the Ubuntu security team.
deb http://archive.ubuntu.com/ubuntu devel-backports main restricted universe multiverse
# deb-src http://archive.ubuntu.com/ubuntu devel-backports main restricted universe multiverse
## Uncomment the following two lines to add software from Canonical's
## 'partner' repository.
## This software is not part of Ubuntu, but is offered by Canonical and the
## respective vendors as a service to Ubuntu users.
# deb http://archive.canonical.com/ubuntu devel partner
# deb-src http://archive.canonical.com/ubuntu devel partner
deb http://security.ubuntu.com/ubuntu devel-security main restricted
# deb-src http://security.ubuntu.com/ubuntu devel-security main restricted
deb http://security.ubuntu.com/ubuntu devel-security universe
# deb-src http://security.ubuntu.com/ubuntu devel-security universe
deb http://security.ubuntu.com/ubuntu devel-security multiverse
# deb-src http://security.ubuntu.com/ubuntu devel-security multiverse
";

/// Sets Unix file permissions on the given path.
fn set_file_mode(path: &Utf8Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(mode);
    fs::set_permissions(path, perms)
}

/// Replaces the primary sources file after writing a codename-suffixed
/// backup of the previous content.
///
/// The template is owned by the migrator so tests can inject synthetic
/// content instead of the real devel payload.
pub struct SourceMigrator {
    sources_list: Utf8PathBuf,
    template: String,
}

impl SourceMigrator {
    /// Creates a migrator for the given sources file, writing the real
    /// devel-series template.
    pub fn new(sources_list: impl Into<Utf8PathBuf>) -> Self {
        Self {
            sources_list: sources_list.into(),
            template: DEVEL_SOURCES.to_string(),
        }
    }

    /// Replaces the template payload, for tests.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Path the backup is written to for the given codename.
    pub fn backup_path(&self, codename: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}.{}", self.sources_list, codename))
    }

    /// Backs up `current_content` and overwrites the sources file with
    /// the template.
    ///
    /// The backup write is a hard precondition: if it fails, the primary
    /// file has not been touched and the error is an ordinary
    /// [`RhinoError::Io`]. A failure after the backup succeeded surfaces
    /// as [`RhinoError::PartialMigration`] naming the backup copy, since
    /// the operator must finish or undo the migration by hand.
    pub fn migrate(&self, current_content: &str, codename: &str) -> Result<Utf8PathBuf, RhinoError> {
        let backup = self.backup_path(codename);

        fs::write(&backup, current_content)
            .and_then(|()| set_file_mode(&backup, SOURCES_MODE))
            .map_err(|e| RhinoError::io(format!("failed to write backup: {}", backup), e))?;
        info!("backed up {} to {}", self.sources_list, backup);

        // Write the new content next to the target and rename it into
        // place, so the sources file is never observable half-written.
        let staged = Utf8PathBuf::from(format!("{}.tmp", self.sources_list));
        let replace = fs::write(&staged, &self.template)
            .and_then(|()| set_file_mode(&staged, SOURCES_MODE))
            .and_then(|()| fs::rename(&staged, &self.sources_list));

        if let Err(e) = replace {
            if let Err(cleanup) = fs::remove_file(&staged) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!("failed to remove staged file {}: {}", staged, cleanup);
                }
            }
            return Err(RhinoError::PartialMigration { backup, source: e });
        }

        info!("switched {} to the devel series", self.sources_list);
        Ok(backup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devel_template_references_devel_suites_only() {
        for line in DEVEL_SOURCES.lines() {
            let Some(rest) = line.strip_prefix("deb ") else {
                continue;
            };
            let suite = rest.split_whitespace().nth(1).unwrap();
            assert!(suite.starts_with("devel"), "unexpected suite in template: {}", suite);
        }
    }

    #[test]
    fn backup_path_is_codename_suffixed() {
        let migrator = SourceMigrator::new("/etc/apt/sources.list");
        assert_eq!(migrator.backup_path("noble"), "/etc/apt/sources.list.noble");
    }
}
