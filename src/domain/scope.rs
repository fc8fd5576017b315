use serde::{Deserialize, Serialize};

/// Whether a domain may be probed directly from our infrastructure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    /// In scope for active network probing
    Active,
    /// Known, but only passive techniques are allowed
    #[default]
    Passive,
}

impl ScopeType {
    /// Parse a scope type from a string (supports short aliases)
    /// - active: a, act, active
    /// - passive: p, pas, passive
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "a" | "act" | "active" => Some(ScopeType::Active),
            "p" | "pas" | "passive" => Some(ScopeType::Passive),
            _ => None,
        }
    }

    /// Get the canonical string representation (as stored in the database)
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Active => "active",
            ScopeType::Passive => "passive",
        }
    }
}

impl std::fmt::Display for ScopeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
