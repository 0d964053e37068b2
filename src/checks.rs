//! Preflight check pipeline.
//!
//! Produces a single go/no-go decision by evaluating a fixed, ordered
//! table of environment checks. Each check is a plain function over the
//! injected [`CommandExecutor`] and host facts, returning a tagged
//! [`CheckOutcome`]; the runner logs Info and Warning outcomes and halts
//! on the first Fatal. The order is deliberate: cheap, certain-to-fail
//! checks (OS family, privileges) run before anything that spawns a
//! subprocess.

use std::fs;

use tracing::{info, warn};

use crate::config::{AptPaths, HostFacts};
use crate::error::RhinoError;
use crate::executor::{CommandExecutor, CommandSpec};

/// Substring that marks a sources file as already tracking the devel series.
pub const DEVEL_MARKER: &str = "devel";

/// The single supported distribution id, as reported by `lsb_release`.
pub const SUPPORTED_DISTRO: &str = "Ubuntu";

/// The distribution-metadata query tool required on PATH.
pub const LSB_RELEASE: &str = "lsb_release";

/// Known desktop-environment packages, scanned in order until the first
/// one reported as installed.
pub const DESKTOP_PACKAGES: [&str; 9] = [
    "kubuntu-desktop",
    "lubuntu-desktop",
    "ubuntu-desktop",
    "ubuntu-budgie-desktop",
    "ubuntukylin-desktop",
    "ubuntu-mate-desktop",
    "ubuntustudio-desktop",
    "xubuntu-desktop",
    "ubuntu-wsl",
];

/// Outcome of one preflight check.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Purely informational, the pipeline continues.
    Info(String),
    /// Recorded and printed, but non-halting.
    Warning(String),
    /// Halts the pipeline and the whole workflow.
    Fatal(RhinoError),
}

/// Ephemeral data gathered while the checks run.
///
/// Exists only for the duration of one run; nothing here is persisted.
#[derive(Debug, Default)]
pub struct EnvironmentSnapshot {
    /// Distribution id (e.g., "Ubuntu").
    pub distro_id: String,
    /// Full distribution description string.
    pub description: String,
    /// Release codename, used to name the backup file.
    pub codename: String,
    /// Raw content of the primary sources file, read once during preflight.
    pub sources_content: String,
    /// `.list` entries found in the secondary source-list directory.
    pub third_party_lists: Vec<String>,
    /// First desktop package detected as installed, if any.
    pub desktop: Option<String>,
}

type CheckFn = fn(&PreflightChecker<'_>, &mut EnvironmentSnapshot) -> CheckOutcome;

/// The fixed check order. The first Fatal stops everything after it.
const CHECKS: [(&str, CheckFn); 8] = [
    ("os-family", check_os_family),
    ("privileges", check_privileges),
    ("lsb-release", check_lsb_release_present),
    ("sources-file", check_sources_file),
    ("distro-id", check_distro_id),
    ("release-type", check_release_type),
    ("desktop-packages", check_desktop_packages),
    ("third-party-sources", check_third_party_sources),
];

/// Runs the ordered preflight checks against an injected executor.
pub struct PreflightChecker<'a> {
    executor: &'a dyn CommandExecutor,
    facts: HostFacts,
    paths: AptPaths,
    skip_desktop_check: bool,
}

impl<'a> PreflightChecker<'a> {
    pub fn new(
        executor: &'a dyn CommandExecutor,
        facts: HostFacts,
        paths: AptPaths,
        skip_desktop_check: bool,
    ) -> Self {
        Self {
            executor,
            facts,
            paths,
            skip_desktop_check,
        }
    }

    /// Evaluates every check in order, halting on the first Fatal.
    ///
    /// On success the codename is captured last (it is only needed to
    /// name the backup file) and the completed snapshot is returned;
    /// nothing on disk has been mutated.
    pub fn run(&self) -> Result<EnvironmentSnapshot, RhinoError> {
        let mut snapshot = EnvironmentSnapshot::default();

        for (name, check) in CHECKS {
            match check(self, &mut snapshot) {
                CheckOutcome::Info(msg) => info!(check = name, "{}", msg),
                CheckOutcome::Warning(msg) => warn!(check = name, "{}", msg),
                CheckOutcome::Fatal(err) => return Err(err),
            }
        }

        snapshot.codename = self.query_codename()?;
        info!("all checks passed");
        Ok(snapshot)
    }

    fn query_codename(&self) -> Result<String, RhinoError> {
        let spec = CommandSpec::new(LSB_RELEASE, ["--codename", "--short"]);
        let result = self.executor.capture(&spec);
        if !result.ok || result.stdout.is_empty() {
            return Err(RhinoError::Environment(
                "failed to query the distribution codename".to_string(),
            ));
        }
        Ok(result.stdout)
    }
}

fn check_os_family(checker: &PreflightChecker<'_>, _: &mut EnvironmentSnapshot) -> CheckOutcome {
    if checker.facts.os == "linux" {
        CheckOutcome::Info("running on a Linux system".to_string())
    } else {
        CheckOutcome::Fatal(RhinoError::Environment(
            "this application only works on Ubuntu systems".to_string(),
        ))
    }
}

fn check_privileges(checker: &PreflightChecker<'_>, _: &mut EnvironmentSnapshot) -> CheckOutcome {
    if checker.facts.euid == 0 {
        CheckOutcome::Info("running as root".to_string())
    } else {
        CheckOutcome::Fatal(RhinoError::Privilege {
            uid: checker.facts.euid,
        })
    }
}

fn check_lsb_release_present(
    checker: &PreflightChecker<'_>,
    _: &mut EnvironmentSnapshot,
) -> CheckOutcome {
    // Probed through the executor rather than looked up in-process so
    // the check stays fakeable in tests.
    let spec = CommandSpec::new("which", [LSB_RELEASE]);
    if checker.executor.capture(&spec).ok {
        CheckOutcome::Info(format!("{} detected", LSB_RELEASE))
    } else {
        CheckOutcome::Fatal(RhinoError::ToolUnavailable(LSB_RELEASE.to_string()))
    }
}

/// Checks 4 and 5 of the pipeline: the primary sources file must be
/// readable, and must not already reference the devel series.
fn check_sources_file(
    checker: &PreflightChecker<'_>,
    snapshot: &mut EnvironmentSnapshot,
) -> CheckOutcome {
    let path = &checker.paths.sources_list;
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return CheckOutcome::Fatal(RhinoError::io(path.to_string(), e)),
    };

    if content.contains(DEVEL_MARKER) {
        return CheckOutcome::Fatal(RhinoError::AlreadyMigrated);
    }

    snapshot.sources_content = content;
    CheckOutcome::Info(format!("{} is not tracking the devel series", path))
}

fn check_distro_id(
    checker: &PreflightChecker<'_>,
    snapshot: &mut EnvironmentSnapshot,
) -> CheckOutcome {
    let spec = CommandSpec::new(LSB_RELEASE, ["--id", "--short"]);
    let result = checker.executor.capture(&spec);
    if !result.ok {
        return CheckOutcome::Fatal(RhinoError::Environment(
            "failed to query the distribution id".to_string(),
        ));
    }

    snapshot.distro_id = result.stdout.clone();
    if result.stdout == SUPPORTED_DISTRO {
        CheckOutcome::Info(format!("{} detected", SUPPORTED_DISTRO))
    } else {
        CheckOutcome::Fatal(RhinoError::Environment(format!(
            "{} detected, which is not supported",
            result.stdout
        )))
    }
}

fn check_release_type(
    checker: &PreflightChecker<'_>,
    snapshot: &mut EnvironmentSnapshot,
) -> CheckOutcome {
    let spec = CommandSpec::new(LSB_RELEASE, ["--description", "--short"]);
    let result = checker.executor.capture(&spec);
    if !result.ok {
        return CheckOutcome::Fatal(RhinoError::Environment(
            "failed to query the distribution description".to_string(),
        ));
    }

    snapshot.description = result.stdout.clone();
    let description = result.stdout;
    if description.contains("development branch") {
        CheckOutcome::Info(format!("{} detected", description))
    } else if description.contains("LTS") {
        CheckOutcome::Fatal(RhinoError::Environment(format!(
            "{} detected, switching an LTS release to the devel series directly is not supported",
            description
        )))
    } else {
        CheckOutcome::Fatal(RhinoError::Environment(format!(
            "{} detected, switching an interim release to the devel series directly is not \
             supported",
            description
        )))
    }
}

fn check_desktop_packages(
    checker: &PreflightChecker<'_>,
    snapshot: &mut EnvironmentSnapshot,
) -> CheckOutcome {
    if checker.skip_desktop_check {
        return CheckOutcome::Info("desktop detection skipped".to_string());
    }

    for package in DESKTOP_PACKAGES {
        let spec =
            CommandSpec::new("apt", ["list", "--installed", package]).with_env("LANG", "C");
        let result = checker.executor.capture(&spec);
        if result.ok && result.stdout.contains("installed") {
            snapshot.desktop = Some(package.to_string());
            return CheckOutcome::Info(format!("detected {}", package));
        }
    }

    CheckOutcome::Fatal(RhinoError::Environment(
        "no installed desktop packages were detected".to_string(),
    ))
}

fn check_third_party_sources(
    checker: &PreflightChecker<'_>,
    snapshot: &mut EnvironmentSnapshot,
) -> CheckOutcome {
    let dir = &checker.paths.sources_list_d;
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => return CheckOutcome::Fatal(RhinoError::io(dir.to_string(), e)),
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return CheckOutcome::Fatal(RhinoError::io(dir.to_string(), e)),
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".list") {
            snapshot.third_party_lists.push(name);
        }
    }

    if snapshot.third_party_lists.is_empty() {
        CheckOutcome::Info("no PPAs detected, this is good".to_string())
    } else {
        CheckOutcome::Warning(
            "PPAs detected, you're responsible for taking care of PPA migrations in the future"
                .to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{CaptureResult, ExecutionResult};

    /// Executor returning a fixed description for the release-type query
    /// and failure for everything else.
    struct DescriptionExecutor {
        description: &'static str,
    }

    impl CommandExecutor for DescriptionExecutor {
        fn capture(&self, spec: &CommandSpec) -> CaptureResult {
            if spec.args == ["--description", "--short"] {
                CaptureResult {
                    stdout: self.description.to_string(),
                    ok: true,
                }
            } else {
                CaptureResult::failed()
            }
        }

        fn run(&self, _spec: &CommandSpec) -> ExecutionResult {
            ExecutionResult { status: None }
        }
    }

    fn checker_with<'a>(executor: &'a dyn CommandExecutor) -> PreflightChecker<'a> {
        PreflightChecker::new(
            executor,
            HostFacts {
                os: "linux".to_string(),
                euid: 0,
            },
            AptPaths::default(),
            true,
        )
    }

    #[test]
    fn release_type_accepts_development_branch() {
        let executor = DescriptionExecutor {
            description: "Ubuntu Questing Quokka (development branch)",
        };
        let checker = checker_with(&executor);
        let mut snapshot = EnvironmentSnapshot::default();
        let outcome = check_release_type(&checker, &mut snapshot);
        assert!(matches!(outcome, CheckOutcome::Info(_)));
        assert_eq!(snapshot.description, "Ubuntu Questing Quokka (development branch)");
    }

    #[test]
    fn release_type_rejects_lts_with_specific_message() {
        let executor = DescriptionExecutor {
            description: "Ubuntu 24.04.1 LTS",
        };
        let checker = checker_with(&executor);
        let outcome = check_release_type(&checker, &mut EnvironmentSnapshot::default());
        let CheckOutcome::Fatal(err) = outcome else {
            panic!("expected Fatal outcome");
        };
        assert!(err.to_string().contains("LTS release"));
    }

    #[test]
    fn release_type_rejects_interim_with_distinct_message() {
        let executor = DescriptionExecutor {
            description: "Ubuntu 25.04",
        };
        let checker = checker_with(&executor);
        let outcome = check_release_type(&checker, &mut EnvironmentSnapshot::default());
        let CheckOutcome::Fatal(err) = outcome else {
            panic!("expected Fatal outcome");
        };
        assert!(err.to_string().contains("interim release"));
        assert!(!err.to_string().contains("LTS release"));
    }

    #[test]
    fn os_family_rejects_non_linux() {
        let executor = DescriptionExecutor { description: "" };
        let checker = PreflightChecker::new(
            &executor,
            HostFacts {
                os: "macos".to_string(),
                euid: 0,
            },
            AptPaths::default(),
            true,
        );
        let outcome = check_os_family(&checker, &mut EnvironmentSnapshot::default());
        assert!(matches!(outcome, CheckOutcome::Fatal(RhinoError::Environment(_))));
    }

    #[test]
    fn privileges_reject_non_root_naming_uid() {
        let executor = DescriptionExecutor { description: "" };
        let checker = PreflightChecker::new(
            &executor,
            HostFacts {
                os: "linux".to_string(),
                euid: 1000,
            },
            AptPaths::default(),
            true,
        );
        let outcome = check_privileges(&checker, &mut EnvironmentSnapshot::default());
        let CheckOutcome::Fatal(RhinoError::Privilege { uid }) = outcome else {
            panic!("expected Privilege error");
        };
        assert_eq!(uid, 1000);
    }

    #[test]
    fn desktop_scan_skipped_probes_nothing() {
        // The executor fails every capture; a skipped scan must not care.
        let executor = DescriptionExecutor { description: "" };
        let checker = checker_with(&executor);
        let mut snapshot = EnvironmentSnapshot::default();
        let outcome = check_desktop_packages(&checker, &mut snapshot);
        assert!(matches!(outcome, CheckOutcome::Info(_)));
        assert!(snapshot.desktop.is_none());
    }

    #[test]
    fn check_order_starts_with_cheap_local_checks() {
        let names: Vec<&str> = CHECKS.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            [
                "os-family",
                "privileges",
                "lsb-release",
                "sources-file",
                "distro-id",
                "release-type",
                "desktop-packages",
                "third-party-sources",
            ]
        );
    }
}
