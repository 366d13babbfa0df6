// ─── Platform Rules ───
// Pure evaluation of Mojang `rules` blocks against an explicit host.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsConstraint>,
    /// Launcher feature flags (`is_demo_user`, `has_custom_resolution`, ...).
    /// This launcher enables none of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<String, bool>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsConstraint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

/// The machine rules are evaluated against. OS names follow the host
/// convention (`linux`, `windows`, `darwin`), arch follows `std::env::consts::ARCH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: String,
    pub arch: String,
}

impl HostPlatform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        Self::new(os, std::env::consts::ARCH)
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    pub fn classpath_separator(&self) -> &'static str {
        if self.is_windows() {
            ";"
        } else {
            ":"
        }
    }

    fn os_matches(&self, name: &str) -> bool {
        name == self.os || (name == "osx" && self.os == "darwin")
    }
}

/// Whether the rule's platform predicate holds on `host`.
///
/// A rule without an `os` block is unconstrained. With one, the name must
/// equal the host OS (`osx` standing in for darwin) and a non-empty arch
/// must equal the host arch.
pub fn complies(rule: &Rule, host: &HostPlatform) -> bool {
    let Some(os) = &rule.os else {
        return true;
    };
    let name_ok = os.name.as_deref().is_some_and(|name| host.os_matches(name));
    let arch_ok = match os.arch.as_deref() {
        None | Some("") => true,
        Some(arch) => arch == host.arch,
    };
    name_ok && arch_ok
}

impl Rule {
    /// Whether this rule lets its library/argument through on `host`.
    pub fn allows(&self, host: &HostPlatform) -> bool {
        if self.features.as_ref().is_some_and(|f| !f.is_empty()) {
            return false;
        }
        match self.action {
            RuleAction::Allow => complies(self, host),
            RuleAction::Disallow => !complies(self, host),
        }
    }
}

/// Active iff every rule allows; vacuously true with no rules.
pub fn is_active(rules: &[Rule], host: &HostPlatform) -> bool {
    rules.iter().all(|rule| rule.allows(host))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os_rule(action: RuleAction, name: Option<&str>, arch: Option<&str>) -> Rule {
        Rule {
            action,
            os: Some(OsConstraint {
                name: name.map(String::from),
                version: None,
                arch: arch.map(String::from),
            }),
            features: None,
        }
    }

    fn hosts() -> Vec<HostPlatform> {
        vec![
            HostPlatform::new("linux", "x86_64"),
            HostPlatform::new("windows", "x86"),
            HostPlatform::new("darwin", "aarch64"),
        ]
    }

    #[test]
    fn matching_os_without_arch_complies_on_every_host() {
        for host in hosts() {
            let name = if host.os == "darwin" { "osx" } else { host.os.as_str() };
            let rule = os_rule(RuleAction::Allow, Some(name), None);
            assert!(complies(&rule, &host), "{:?}", host);

            let empty_arch = os_rule(RuleAction::Allow, Some(name), Some(""));
            assert!(complies(&empty_arch, &host), "{:?}", host);
        }
    }

    #[test]
    fn conflicting_arch_never_complies() {
        for host in hosts() {
            let rule = os_rule(RuleAction::Allow, Some(host.os.as_str()), Some("sparc64"));
            assert!(!complies(&rule, &host), "{:?}", host);
        }
    }

    #[test]
    fn other_os_does_not_comply() {
        let host = HostPlatform::new("linux", "x86_64");
        assert!(!complies(&os_rule(RuleAction::Allow, Some("windows"), None), &host));
        assert!(!complies(&os_rule(RuleAction::Allow, Some("osx"), None), &host));
    }

    #[test]
    fn darwin_host_accepts_osx_and_darwin() {
        let host = HostPlatform::new("darwin", "aarch64");
        assert!(complies(&os_rule(RuleAction::Allow, Some("osx"), None), &host));
        assert!(complies(&os_rule(RuleAction::Allow, Some("darwin"), None), &host));
    }

    #[test]
    fn arch_only_constraint_requires_a_name() {
        let host = HostPlatform::new("windows", "x86");
        assert!(!complies(&os_rule(RuleAction::Allow, None, Some("x86")), &host));
    }

    #[test]
    fn no_rules_is_active() {
        assert!(is_active(&[], &HostPlatform::new("linux", "x86_64")));
    }

    #[test]
    fn allow_everywhere_then_disallow_osx() {
        let rules = vec![
            Rule {
                action: RuleAction::Allow,
                os: None,
                features: None,
            },
            os_rule(RuleAction::Disallow, Some("osx"), None),
        ];
        assert!(is_active(&rules, &HostPlatform::new("linux", "x86_64")));
        assert!(!is_active(&rules, &HostPlatform::new("darwin", "aarch64")));
    }

    #[test]
    fn feature_gated_rules_are_inactive() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "action": "allow",
            "features": { "is_demo_user": true }
        }))
        .unwrap();
        assert!(!is_active(&[rule], &HostPlatform::new("linux", "x86_64")));
    }

    #[test]
    fn classpath_separator_follows_host() {
        assert_eq!(HostPlatform::new("windows", "x86_64").classpath_separator(), ";");
        assert_eq!(HostPlatform::new("linux", "x86_64").classpath_separator(), ":");
    }
}
