//! Capability policy for preview documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::{Result, SandboxError};

/// A permission a sandboxed document may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Run inline scripts
    Scripts,
    /// alert/confirm/prompt
    Modals,
    /// Submit forms
    Forms,
    /// Open new windows
    Popups,
    /// Start downloads
    Downloads,
    /// Keep the host origin (storage, cookies)
    SameOrigin,
    /// Navigate the host page
    TopNavigation,
}

impl Capability {
    /// Token used in the iframe `sandbox` attribute and CSP directive.
    pub fn token(self) -> &'static str {
        match self {
            Capability::Scripts => "allow-scripts",
            Capability::Modals => "allow-modals",
            Capability::Forms => "allow-forms",
            Capability::Popups => "allow-popups",
            Capability::Downloads => "allow-downloads",
            Capability::SameOrigin => "allow-same-origin",
            Capability::TopNavigation => "allow-top-navigation",
        }
    }

    /// Capabilities that would hand host privileges to user script.
    pub fn escapes_sandbox(self) -> bool {
        matches!(self, Capability::SameOrigin | Capability::TopNavigation)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Capability {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        let name = name.strip_prefix("allow-").unwrap_or(&name);
        match name.replace('_', "-").as_str() {
            "scripts" => Ok(Capability::Scripts),
            "modals" => Ok(Capability::Modals),
            "forms" => Ok(Capability::Forms),
            "popups" => Ok(Capability::Popups),
            "downloads" => Ok(Capability::Downloads),
            "same-origin" => Ok(Capability::SameOrigin),
            "top-navigation" => Ok(Capability::TopNavigation),
            _ => Err(SandboxError::UnknownCapability(s.to_string())),
        }
    }
}

/// The set of capabilities granted to executed documents.
///
/// Scripts are on by default. Same-origin access and top-level
/// navigation can never be granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyRepr", into = "PolicyRepr")]
pub struct SandboxPolicy {
    granted: BTreeSet<Capability>,
}

/// Wire form of a policy. Decoding goes through [`SandboxPolicy::grant`].
#[derive(Serialize, Deserialize)]
struct PolicyRepr {
    granted: Vec<Capability>,
}

impl TryFrom<PolicyRepr> for SandboxPolicy {
    type Error = SandboxError;

    fn try_from(repr: PolicyRepr) -> Result<Self> {
        repr.granted
            .into_iter()
            .try_fold(Self::locked(), SandboxPolicy::grant)
    }
}

impl From<SandboxPolicy> for PolicyRepr {
    fn from(policy: SandboxPolicy) -> Self {
        Self {
            granted: policy.granted.into_iter().collect(),
        }
    }
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self::scripts_only()
    }
}

impl SandboxPolicy {
    /// Policy granting only script execution.
    pub fn scripts_only() -> Self {
        Self {
            granted: BTreeSet::from([Capability::Scripts]),
        }
    }

    /// Policy granting nothing at all.
    pub fn locked() -> Self {
        Self {
            granted: BTreeSet::new(),
        }
    }

    /// Build a policy from capability names, e.g. from configuration.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut policy = Self::locked();
        for name in names {
            policy = policy.grant(name.as_ref().parse()?)?;
        }
        Ok(policy)
    }

    /// Grant one more capability.
    pub fn grant(mut self, capability: Capability) -> Result<Self> {
        if capability.escapes_sandbox() {
            return Err(SandboxError::ForbiddenCapability(capability));
        }
        self.granted.insert(capability);
        Ok(self)
    }

    /// Withdraw a capability.
    pub fn revoke(mut self, capability: Capability) -> Self {
        self.granted.remove(&capability);
        self
    }

    pub fn permits(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.granted.iter().copied()
    }

    /// Value for an iframe `sandbox` attribute, e.g. `allow-scripts`.
    pub fn iframe_attribute(&self) -> String {
        self.granted
            .iter()
            .map(|c| c.token())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Value for a `Content-Security-Policy` header, e.g. `sandbox allow-scripts`.
    pub fn csp_header(&self) -> String {
        let tokens = self.iframe_attribute();
        if tokens.is_empty() {
            "sandbox".to_string()
        } else {
            format!("sandbox {tokens}")
        }
    }
}
