//! Static audit rule tables
//!
//! All scoring is driven by four fixed tables:
//! 1. Capability weights - per granted API permission
//! 2. Host-access classes - evaluated first-match-wins over host patterns
//! 3. Install-provenance weights - where the extension came from
//! 4. Setting risk - recommended values and per-value point deltas
//!
//! A fifth table describes the manual verification checklist. Tables are
//! versioned in code and never editable at runtime.

use std::collections::BTreeSet;

use crate::{FactorCategory, InstallKind, RiskFactor, RiskTier, SettingValue, StatusTier};

/// One scored API capability
pub struct CapabilityRule {
    /// Capability name as declared by the extension
    pub name: &'static str,
    /// Points added to the raw risk sum
    pub weight: i32,
    /// Tier shown for this factor
    pub tier: RiskTier,
    /// What granting this capability allows
    pub description: &'static str,
    /// Guidance shown in the reference listing
    pub advice: &'static str,
}

pub const CAPABILITY_RULES: &[CapabilityRule] = &[
    CapabilityRule {
        name: "webRequestBlocking",
        weight: 25,
        tier: RiskTier::High,
        description: "Can intercept and modify all web traffic",
        advice: "Only grant to trusted extensions like ad blockers",
    },
    CapabilityRule {
        name: "debugger",
        weight: 25,
        tier: RiskTier::High,
        description: "Can debug and control other tabs and extensions",
        advice: "Should only be used by development tools",
    },
    CapabilityRule {
        name: "nativeMessaging",
        weight: 20,
        tier: RiskTier::High,
        description: "Can talk to native applications on this machine",
        advice: "Review carefully, this reaches outside the browser sandbox",
    },
    CapabilityRule {
        name: "webRequest",
        weight: 15,
        tier: RiskTier::High,
        description: "Can observe all network requests",
        advice: "May collect browsing data",
    },
    CapabilityRule {
        name: "cookies",
        weight: 15,
        tier: RiskTier::High,
        description: "Can read and modify cookies for all websites",
        advice: "May access session tokens and login credentials",
    },
    CapabilityRule {
        name: "proxy",
        weight: 15,
        tier: RiskTier::High,
        description: "Can control the network proxy settings",
        advice: "Could route all traffic through third-party servers",
    },
    CapabilityRule {
        name: "privacy",
        weight: 10,
        tier: RiskTier::High,
        description: "Can modify browser privacy settings",
        advice: "Verify the extension's reputation before allowing",
    },
    CapabilityRule {
        name: "management",
        weight: 10,
        tier: RiskTier::Medium,
        description: "Can read extension data and enable or disable extensions",
        advice: "Legitimate for extension managers, suspicious elsewhere",
    },
    CapabilityRule {
        name: "tabs",
        weight: 5,
        tier: RiskTier::Medium,
        description: "Can see titles and URLs of open tabs",
        advice: "May track browsing activity",
    },
    CapabilityRule {
        name: "history",
        weight: 5,
        tier: RiskTier::Medium,
        description: "Can read and modify browsing history",
        advice: "Full access to past browsing records",
    },
    CapabilityRule {
        name: "downloads",
        weight: 5,
        tier: RiskTier::Medium,
        description: "Can manage downloads and access download history",
        advice: "Could potentially inject malicious files",
    },
    CapabilityRule {
        name: "geolocation",
        weight: 5,
        tier: RiskTier::Medium,
        description: "Can access the device's physical location",
        advice: "May track your whereabouts",
    },
    CapabilityRule {
        name: "bookmarks",
        weight: 3,
        tier: RiskTier::Medium,
        description: "Can read and modify bookmarks",
        advice: "Low risk but reveals your interests",
    },
];

/// Look up the rule for one capability name
pub fn capability_rule(name: &str) -> Option<&'static CapabilityRule> {
    CAPABILITY_RULES.iter().find(|r| r.name == name)
}

// ============================================================
// Host-access classes
// ============================================================

/// Classify a host-permission set into at most one breakdown factor.
///
/// Classes are evaluated in priority order and the first match wins; the
/// classes are never cumulative. An HTTP-only and an HTTPS-only universal
/// wildcard granted together are two halves of the same "all sites" grant,
/// so they collapse into one 30-point factor instead of two 15-point ones.
pub fn classify_host_access(host_permissions: &BTreeSet<String>) -> Option<RiskFactor> {
    let has_all_urls = host_permissions.contains("<all_urls>")
        || host_permissions.iter().any(|p| p.contains("*://*/*"));
    let has_http_wildcard = host_permissions.contains("http://*/*");
    let has_https_wildcard = host_permissions.contains("https://*/*");

    if has_all_urls {
        return Some(RiskFactor {
            category: FactorCategory::Host,
            label: "All URLs access".to_string(),
            weight: 30,
            tier: RiskTier::High,
            detail: "Full access to every website you visit".to_string(),
        });
    }
    if has_http_wildcard && has_https_wildcard {
        return Some(RiskFactor {
            category: FactorCategory::Host,
            label: "All URLs access (HTTP + HTTPS)".to_string(),
            weight: 30,
            tier: RiskTier::High,
            detail: "Full access to every website over both HTTP and HTTPS".to_string(),
        });
    }
    if has_https_wildcard {
        return Some(RiskFactor {
            category: FactorCategory::Host,
            label: "All HTTPS sites".to_string(),
            weight: 15,
            tier: RiskTier::Medium,
            detail: "Access to every HTTPS website".to_string(),
        });
    }
    if has_http_wildcard {
        return Some(RiskFactor {
            category: FactorCategory::Host,
            label: "All HTTP sites".to_string(),
            weight: 15,
            tier: RiskTier::Medium,
            detail: "Access to every HTTP website".to_string(),
        });
    }
    let wildcard_count = host_permissions.iter().filter(|p| p.contains('*')).count();
    if wildcard_count > 0 {
        return Some(RiskFactor {
            category: FactorCategory::Host,
            label: format!("Wildcard domains ({})", wildcard_count),
            weight: 15,
            tier: RiskTier::Medium,
            detail: "Access to multiple websites through wildcard patterns".to_string(),
        });
    }
    None
}

// ============================================================
// Install provenance
// ============================================================

/// One scored install provenance
pub struct ProvenanceRule {
    pub kind: InstallKind,
    /// Points added to the raw risk sum
    pub weight: i32,
    pub tier: RiskTier,
    pub description: &'static str,
    pub advice: &'static str,
}

pub const PROVENANCE_RULES: &[ProvenanceRule] = &[
    ProvenanceRule {
        kind: InstallKind::Sideload,
        weight: 20,
        tier: RiskTier::High,
        description: "Installed from outside the browser's store",
        advice: "Not reviewed by the store, verify the source carefully",
    },
    ProvenanceRule {
        kind: InstallKind::Development,
        weight: 15,
        tier: RiskTier::Medium,
        description: "Loaded from local files with developer mode",
        advice: "Make sure you trust the source code",
    },
    ProvenanceRule {
        kind: InstallKind::Other,
        weight: 10,
        tier: RiskTier::Medium,
        description: "Unknown installation source",
        advice: "Investigate how this extension was installed",
    },
    ProvenanceRule {
        kind: InstallKind::Store,
        weight: 0,
        tier: RiskTier::Low,
        description: "Installed from the browser's store",
        advice: "Store-reviewed but still verify the permissions",
    },
];

/// Look up the rule for one install provenance; enterprise-managed installs
/// have no entry and carry no weight
pub fn provenance_rule(kind: InstallKind) -> Option<&'static ProvenanceRule> {
    PROVENANCE_RULES.iter().find(|r| r.kind == kind)
}

// ============================================================
// Browser setting risk
// ============================================================

/// Expected value in a setting rule, matched against observed values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingValueSpec {
    Bool(bool),
    Keyword(&'static str),
}

impl SettingValueSpec {
    pub fn matches(&self, observed: &SettingValue) -> bool {
        match (self, observed) {
            (SettingValueSpec::Bool(a), SettingValue::Bool(b)) => a == b,
            (SettingValueSpec::Keyword(a), SettingValue::Keyword(b)) => *a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for SettingValueSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValueSpec::Bool(v) => write!(f, "{}", v),
            SettingValueSpec::Keyword(s) => write!(f, "{}", s),
        }
    }
}

/// One recognized observed value and what it means
pub struct SettingOutcome {
    pub value: SettingValueSpec,
    pub tier: StatusTier,
    /// Point delta applied to the browser score, never positive
    pub delta: i32,
    pub label: &'static str,
}

/// Risk rule for one auto-readable browser setting
pub struct SettingRule {
    /// Setting identifier as exposed by the settings source
    pub id: &'static str,
    /// Human name
    pub name: &'static str,
    pub recommended: SettingValueSpec,
    pub outcomes: &'static [SettingOutcome],
    pub explanation: &'static str,
    pub how_to_fix: &'static str,
}

impl SettingRule {
    /// Match an observed value against this rule's recognized outcomes
    pub fn outcome_for(&self, observed: &SettingValue) -> Option<&'static SettingOutcome> {
        self.outcomes.iter().find(|o| o.value.matches(observed))
    }
}

pub const SETTING_RULES: &[SettingRule] = &[
    SettingRule {
        id: "network.webRTCIPHandlingPolicy",
        name: "WebRTC IP handling",
        recommended: SettingValueSpec::Keyword("default_public_interface_only"),
        outcomes: &[
            SettingOutcome {
                value: SettingValueSpec::Keyword("default"),
                tier: StatusTier::Warning,
                delta: -10,
                label: "May leak IP",
            },
            SettingOutcome {
                value: SettingValueSpec::Keyword("default_public_interface_only"),
                tier: StatusTier::Secure,
                delta: 0,
                label: "Protected",
            },
            SettingOutcome {
                value: SettingValueSpec::Keyword("disable_non_proxied_udp"),
                tier: StatusTier::Secure,
                delta: 0,
                label: "Protected",
            },
        ],
        explanation: "WebRTC can leak the real IP address even behind a VPN. \
                      Restricting WebRTC IP handling closes that leak.",
        how_to_fix: "Settings -> Privacy and security -> restrict WebRTC to the \
                     public interface only",
    },
    SettingRule {
        id: "network.networkPredictionEnabled",
        name: "Network prediction (DNS prefetching)",
        recommended: SettingValueSpec::Bool(false),
        outcomes: &[
            SettingOutcome {
                value: SettingValueSpec::Bool(true),
                tier: StatusTier::Warning,
                delta: -5,
                label: "Privacy risk",
            },
            SettingOutcome {
                value: SettingValueSpec::Bool(false),
                tier: StatusTier::Secure,
                delta: 0,
                label: "Disabled",
            },
        ],
        explanation: "Prediction preloads pages for faster browsing but reveals \
                      browsing intent to DNS servers before any link is clicked.",
        how_to_fix: "Settings -> Performance -> disable page preloading",
    },
    SettingRule {
        id: "services.safeBrowsingEnabled",
        name: "Safe Browsing",
        recommended: SettingValueSpec::Bool(true),
        outcomes: &[
            SettingOutcome {
                value: SettingValueSpec::Bool(false),
                tier: StatusTier::Risky,
                delta: -20,
                label: "Disabled, critical risk",
            },
            SettingOutcome {
                value: SettingValueSpec::Bool(true),
                tier: StatusTier::Secure,
                delta: 0,
                label: "Enabled",
            },
        ],
        explanation: "Safe Browsing warns about malicious websites, phishing and \
                      dangerous downloads. Running without it is extremely risky.",
        how_to_fix: "Settings -> Security -> enable Safe Browsing, at least the \
                     standard protection level",
    },
    SettingRule {
        id: "services.alternateErrorPagesEnabled",
        name: "Alternate error pages",
        recommended: SettingValueSpec::Bool(false),
        outcomes: &[
            SettingOutcome {
                value: SettingValueSpec::Bool(true),
                tier: StatusTier::Warning,
                delta: -5,
                label: "Sends failed URLs upstream",
            },
            SettingOutcome {
                value: SettingValueSpec::Bool(false),
                tier: StatusTier::Secure,
                delta: 0,
                label: "Disabled",
            },
        ],
        explanation: "When a page fails to load, the browser sends its URL to the \
                      vendor to suggest alternatives, revealing browsing data.",
        how_to_fix: "Settings -> Privacy and security -> disable suggestions for \
                     pages that fail to load",
    },
    SettingRule {
        id: "websites.thirdPartyCookiesAllowed",
        name: "Third-party cookies",
        recommended: SettingValueSpec::Bool(false),
        outcomes: &[
            SettingOutcome {
                value: SettingValueSpec::Bool(true),
                tier: StatusTier::Warning,
                delta: -10,
                label: "Tracking enabled",
            },
            SettingOutcome {
                value: SettingValueSpec::Bool(false),
                tier: StatusTier::Secure,
                delta: 0,
                label: "Blocked",
            },
        ],
        explanation: "Third-party cookies enable cross-site tracking by advertisers \
                      and analytics networks. Blocking them improves privacy.",
        how_to_fix: "Settings -> Cookies -> block third-party cookies",
    },
    SettingRule {
        id: "websites.hyperlinkAuditingEnabled",
        name: "Hyperlink auditing",
        recommended: SettingValueSpec::Bool(false),
        outcomes: &[
            SettingOutcome {
                value: SettingValueSpec::Bool(true),
                tier: StatusTier::Warning,
                delta: -5,
                label: "Click tracking",
            },
            SettingOutcome {
                value: SettingValueSpec::Bool(false),
                tier: StatusTier::Secure,
                delta: 0,
                label: "Disabled",
            },
        ],
        explanation: "Hyperlink auditing lets websites report which links get \
                      clicked through ping requests.",
        how_to_fix: "Not exposed in the settings UI, requires a managed policy",
    },
    SettingRule {
        id: "websites.referrersEnabled",
        name: "Referrer headers",
        recommended: SettingValueSpec::Bool(false),
        outcomes: &[
            SettingOutcome {
                value: SettingValueSpec::Bool(true),
                tier: StatusTier::Warning,
                delta: -5,
                label: "Privacy leak",
            },
            SettingOutcome {
                value: SettingValueSpec::Bool(false),
                tier: StatusTier::Secure,
                delta: 0,
                label: "Limited",
            },
        ],
        explanation: "Referrer headers tell websites where a visit came from, \
                      potentially leaking private URLs and browsing patterns.",
        how_to_fix: "Cannot be fully disabled in the UI, modern browsers reduce \
                     referrers by default",
    },
];

/// Look up the rule for one setting identifier
pub fn setting_rule(id: &str) -> Option<&'static SettingRule> {
    SETTING_RULES.iter().find(|r| r.id == id)
}

// ============================================================
// Manual verification checklist
// ============================================================

/// Grouping of a manual check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckCategory {
    Critical,
    Important,
    Privacy,
}

impl std::fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckCategory::Critical => write!(f, "Critical"),
            CheckCategory::Important => write!(f, "Important"),
            CheckCategory::Privacy => write!(f, "Privacy"),
        }
    }
}

/// One browser hardening step the user verifies by hand
pub struct ManualCheck {
    pub id: &'static str,
    pub name: &'static str,
    pub category: CheckCategory,
    /// Human description of the recommended state
    pub recommended: &'static str,
    /// Point delta while unverified, never positive
    pub penalty: i32,
    /// Tier shown while unverified
    pub tier: StatusTier,
    /// Label shown while unverified
    pub unmet_label: &'static str,
    pub explanation: &'static str,
    pub how_to_check: &'static str,
    pub how_to_fix: &'static str,
}

pub const MANUAL_CHECKS: &[ManualCheck] = &[
    ManualCheck {
        id: "enhanced-protection",
        name: "Enhanced Safe Browsing protection",
        category: CheckCategory::Critical,
        recommended: "Enabled",
        penalty: -15,
        tier: StatusTier::Risky,
        unmet_label: "Not enabled",
        explanation: "Enhanced protection is the strongest defense against dangerous \
                      sites and downloads, with proactive detection and warnings.",
        how_to_check: "Settings -> Security -> confirm the enhanced protection level \
                      is selected",
        how_to_fix: "Settings -> Security -> select enhanced protection",
    },
    ManualCheck {
        id: "password-manager",
        name: "Password manager with breach detection",
        category: CheckCategory::Critical,
        recommended: "Enabled",
        penalty: -10,
        tier: StatusTier::Risky,
        unmet_label: "Weak password risk",
        explanation: "The built-in password manager generates strong passwords and \
                      alerts when saved passwords appear in known data breaches.",
        how_to_check: "Settings -> Passwords -> confirm offering to save passwords is on",
        how_to_fix: "Settings -> Passwords -> enable saving and run a password checkup",
    },
    ManualCheck {
        id: "https-first",
        name: "HTTPS-first mode",
        category: CheckCategory::Important,
        recommended: "Enabled",
        penalty: -10,
        tier: StatusTier::Warning,
        unmet_label: "Unencrypted connections",
        explanation: "HTTPS-first mode upgrades connections to encrypted HTTPS, \
                      protecting traffic from eavesdropping and tampering.",
        how_to_check: "Settings -> Security -> confirm always using secure connections is on",
        how_to_fix: "Settings -> Security -> enable always using secure connections",
    },
    ManualCheck {
        id: "privacy-sandbox",
        name: "Privacy sandbox ad topics",
        category: CheckCategory::Privacy,
        recommended: "Disabled",
        penalty: -5,
        tier: StatusTier::Warning,
        unmet_label: "Interest tracking",
        explanation: "The privacy sandbox builds an interest profile from browsing \
                      history. Disabling it stops interest tracking entirely.",
        how_to_check: "Settings -> Ad privacy -> review ad topics, site-suggested ads \
                      and ad measurement",
        how_to_fix: "Settings -> Ad privacy -> disable all three options",
    },
    ManualCheck {
        id: "do-not-track",
        name: "Do Not Track header",
        category: CheckCategory::Privacy,
        recommended: "Enabled",
        penalty: -3,
        tier: StatusTier::Warning,
        unmet_label: "Not sent",
        explanation: "Do Not Track asks websites not to track the visit. Not every \
                      site honors it, but it costs nothing to send.",
        how_to_check: "Settings -> Privacy and security -> confirm the Do Not Track \
                      request is on",
        how_to_fix: "Settings -> Privacy and security -> enable the Do Not Track request",
    },
    ManualCheck {
        id: "site-permissions",
        name: "Default site permissions (location, camera, mic)",
        category: CheckCategory::Important,
        recommended: "Ask",
        penalty: -15,
        tier: StatusTier::Risky,
        unmet_label: "Always allowed",
        explanation: "Websites should never get automatic access to location, camera \
                      or microphone. Sensitive permissions need explicit consent.",
        how_to_check: "Settings -> Site settings -> confirm location, camera and \
                      microphone are set to ask",
        how_to_fix: "Settings -> Site settings -> set location, camera and microphone \
                     to ask before accessing",
    },
    ManualCheck {
        id: "site-isolation",
        name: "Site isolation (Spectre protection)",
        category: CheckCategory::Critical,
        recommended: "Default",
        penalty: -30,
        tier: StatusTier::Risky,
        unmet_label: "Disabled, critical vulnerability",
        explanation: "Site isolation keeps each site in its own process as a defense \
                      against Spectre-class CPU attacks. Opting out is dangerous.",
        how_to_check: "Flags page -> site isolation trial opt-out -> must be default, \
                      not disabled",
        how_to_fix: "Flags page -> reset site isolation to default and restart the browser",
    },
    ManualCheck {
        id: "insecure-origins-whitelist",
        name: "Insecure origins treated as secure",
        category: CheckCategory::Critical,
        recommended: "Disabled/empty",
        penalty: -20,
        tier: StatusTier::Risky,
        unmet_label: "Security bypass active",
        explanation: "This flag treats listed plain-HTTP origins as if they were \
                      secure. Every listed site is open to eavesdropping and tampering.",
        how_to_check: "Flags page -> insecure origins treated as secure -> must be \
                      disabled or empty",
        how_to_fix: "Flags page -> disable the flag, remove any listed URLs and restart",
    },
    ManualCheck {
        id: "webtransport-dev-mode",
        name: "WebTransport developer mode",
        category: CheckCategory::Critical,
        recommended: "Disabled",
        penalty: -15,
        tier: StatusTier::Risky,
        unmet_label: "Certificate checks disabled",
        explanation: "WebTransport developer mode drops certificate verification, \
                      allowing connections to untrusted servers. Development only.",
        how_to_check: "Flags page -> WebTransport developer mode -> must be disabled",
        how_to_fix: "Flags page -> disable WebTransport developer mode and restart",
    },
    ManualCheck {
        id: "fingerprinting-protection",
        name: "Fingerprinting protection",
        category: CheckCategory::Privacy,
        recommended: "Default",
        penalty: -10,
        tier: StatusTier::Warning,
        unmet_label: "Tracking risk",
        explanation: "Fingerprinting protection blocks scripts that identify a user \
                      from the browser's unique configuration.",
        how_to_check: "Flags page -> fingerprinting protection blocklist flags -> both \
                      must be default",
        how_to_fix: "Flags page -> set both fingerprinting flags to default and restart",
    },
    ManualCheck {
        id: "ip-protection",
        name: "IP protection proxy",
        category: CheckCategory::Privacy,
        recommended: "Default",
        penalty: -10,
        tier: StatusTier::Warning,
        unmet_label: "IP tracking enabled",
        explanation: "IP protection masks the IP address from third-party trackers. \
                      Opting out makes location and cross-site tracking easier.",
        how_to_check: "Flags page -> IP protection proxy opt-out -> must be default",
        how_to_fix: "Flags page -> reset the opt-out flag to default and restart",
    },
    ManualCheck {
        id: "canvas-protection-incognito",
        name: "Canvas fingerprinting protection (private mode)",
        category: CheckCategory::Privacy,
        recommended: "Default",
        penalty: -8,
        tier: StatusTier::Warning,
        unmet_label: "Private-mode fingerprinting",
        explanation: "Canvas readbacks can fingerprint a browser. In private windows \
                      the browser can add noise or block readbacks entirely.",
        how_to_check: "Flags page -> canvas noise and canvas readback flags -> both \
                      must be default",
        how_to_fix: "Flags page -> set both canvas flags to default and restart",
    },
    ManualCheck {
        id: "unsafe-webgpu",
        name: "Unsafe WebGPU support",
        category: CheckCategory::Important,
        recommended: "Disabled",
        penalty: -10,
        tier: StatusTier::Warning,
        unmet_label: "Security risk",
        explanation: "Unsafe WebGPU enables experimental GPU features on unsupported \
                      configurations, widening the attack surface. Development only.",
        how_to_check: "Flags page -> unsafe WebGPU -> must be disabled",
        how_to_fix: "Flags page -> disable unsafe WebGPU and restart",
    },
];

/// Look up one manual check by identifier
pub fn manual_check(id: &str) -> Option<&'static ManualCheck> {
    MANUAL_CHECKS.iter().find(|c| c.id == id)
}
