use crate::brew::{Brew, Selection, parse_formulae};
use crate::json::{Formula, Requirement};
use std::collections::HashMap;
use whence_lookup::{PackageStatus, Status};

/// Installation status of a fixed set of formulae, queried from `brew` once.
#[derive(Debug, Default)]
pub struct BrewStatus {
    statuses: HashMap<String, Status>,
}
impl BrewStatus {
    /// Describe `packages`.
    ///
    /// `brew info` rejects the whole query when any name is unknown, so a
    /// failed batch is retried one name at a time; names `brew` still can't
    /// describe are left out.
    pub fn query(brew: &Brew, packages: &[&str]) -> Self {
        if packages.is_empty() {
            return Self::default();
        }
        let formulae = match brew.info(Selection::Named(packages)) {
            Ok(values) => parse_formulae(values),
            Err(e) => {
                tracing::debug!(error = %e, "Batch lookup failed; querying formulae one at a time");
                packages
                    .iter()
                    .filter_map(|package| match brew.info(Selection::Named(&[*package])) {
                        Ok(values) => Some(parse_formulae(values)),
                        Err(e) => {
                            tracing::debug!(package, error = %e, "Unknown formula");
                            None
                        },
                    })
                    .flatten()
                    .collect()
            },
        };
        Self::from_formulae(&formulae)
    }

    pub fn from_formulae(formulae: &[Formula]) -> Self {
        let mut statuses = HashMap::new();
        for formula in formulae {
            let status = Status {
                installed: formula.latest_installed(),
                requirements_satisfied: formula.required_requirements().all(is_satisfied),
            };
            statuses.insert(formula.name.clone(), status);
            statuses.insert(formula.key().to_string(), status);
        }
        Self { statuses }
    }
}

impl PackageStatus for BrewStatus {
    fn status(&self, package: &str) -> Option<Status> {
        self.statuses.get(package).copied()
    }
}

/// Best-effort check of a formula requirement against this machine.
///
/// Platform requirements compare against the build target; anything else is
/// satisfied when an executable of the same name is on `PATH`.
fn is_satisfied(requirement: &Requirement) -> bool {
    let satisfied = match requirement.name.as_str() {
        "macos" => cfg!(target_os = "macos"),
        "linux" => cfg!(target_os = "linux"),
        "xcode" => which::which("xcodebuild").is_ok(),
        "arch" => requirement.version.as_deref().is_none_or(|arch| arch_matches(arch)),
        name => which::which(name).is_ok(),
    };
    if !satisfied {
        tracing::debug!(requirement = %requirement.name, "Requirement not satisfied");
    }
    satisfied
}

fn arch_matches(arch: &str) -> bool {
    match (arch, std::env::consts::ARCH) {
        ("arm64" | "arm", "aarch64") => true,
        ("intel" | "x86_64", "x86_64") => true,
        (wanted, actual) => wanted == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn formula(value: serde_json::Value) -> Formula {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_status_from_formulae() {
        let status = BrewStatus::from_formulae(&[
            formula(json!({
                "name": "jq", "full_name": "jq", "versions": {"stable": "1.7.1"}, "installed": [{"version": "1.7.1"}]
            })),
            formula(json!({
                "name": "wget", "full_name": "wget", "versions": {"stable": "1.24.5"}, "installed": [{"version": "1.21"}]
            })),
            formula(json!({"name": "tool", "full_name": "someone/tap/tool", "versions": {"stable": "1"}})),
        ]);
        assert_eq!(status.status("jq"), Some(Status { installed: true, requirements_satisfied: true }));
        assert_eq!(status.status("wget"), Some(Status { installed: false, requirements_satisfied: true }));
        assert!(status.status("tool").is_some());
        assert!(status.status("someone/tap/tool").is_some());
        assert_eq!(status.status("curl"), None);
    }

    #[test]
    fn test_only_required_requirements_count() {
        let status = BrewStatus::from_formulae(&[formula(json!({
            "name": "gcc-tool",
            "versions": {"stable": "1"},
            "requirements": [{"name": "definitely-not-on-path-whence", "contexts": ["build"]}]
        }))]);
        assert!(status.status("gcc-tool").unwrap().requirements_satisfied);

        let status = BrewStatus::from_formulae(&[formula(json!({
            "name": "gcc-tool",
            "versions": {"stable": "1"},
            "requirements": [{"name": "definitely-not-on-path-whence", "contexts": []}]
        }))]);
        assert!(!status.status("gcc-tool").unwrap().requirements_satisfied);
    }

    #[rstest]
    #[case("macos", cfg!(target_os = "macos"))]
    #[case("linux", cfg!(target_os = "linux"))]
    fn test_platform_requirements(#[case] name: &str, #[case] expected: bool) {
        let requirement = Requirement { name: name.to_string(), ..Default::default() };
        assert_eq!(is_satisfied(&requirement), expected);
    }

    #[test]
    fn test_arch_requirement() {
        let native =
            Requirement { name: "arch".into(), version: Some(std::env::consts::ARCH.into()), ..Default::default() };
        assert!(is_satisfied(&native));
        let foreign = Requirement { name: "arch".into(), version: Some("sparc".into()), ..Default::default() };
        assert!(!is_satisfied(&foreign));
    }

    #[cfg(unix)]
    #[test]
    fn test_query_falls_back_to_single_names() {
        use crate::brew::tests::fake_brew;
        let temp_dir = tempfile::tempdir().unwrap();
        let brew = fake_brew(temp_dir.path(), &json!({}));
        let jq = json!({"formulae": [{"name": "jq", "full_name": "jq", "versions": {"stable": "1.7.1"}}]});
        std::fs::write(temp_dir.path().join("named-jq.json"), jq.to_string()).unwrap();

        let status = BrewStatus::query(&brew, &["jq", "nonexistent"]);
        assert_eq!(status.status("jq"), Some(Status { installed: false, requirements_satisfied: true }));
        assert_eq!(status.status("nonexistent"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_query_batch() {
        use crate::brew::tests::fake_brew;
        let temp_dir = tempfile::tempdir().unwrap();
        let brew = fake_brew(temp_dir.path(), &json!({}));
        let both = json!({"formulae": [
            {"name": "netcat", "full_name": "netcat", "versions": {"stable": "0.7.1"}},
            {"name": "socat", "full_name": "socat", "versions": {"stable": "1.8"}, "installed": [{"version": "1.8"}]}
        ]});
        std::fs::write(temp_dir.path().join("named-netcat+socat.json"), both.to_string()).unwrap();

        let status = BrewStatus::query(&brew, &["netcat", "socat"]);
        assert!(!status.status("netcat").unwrap().installed);
        assert!(status.status("socat").unwrap().installed);
    }
}
