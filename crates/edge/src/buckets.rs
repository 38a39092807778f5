//! Versioned cache bucket names.

/// Default cache version. Bumping it is the only way to invalidate caches.
pub const CACHE_VERSION: &str = "v1";

const PREFIX: &str = "stillwaters";

/// The three buckets for one cache version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets {
    pub static_assets: String,
    pub dynamic: String,
    pub api: String,
}

impl Buckets {
    #[must_use]
    pub fn new(version: &str) -> Self {
        Self {
            static_assets: format!("{PREFIX}-static-{version}"),
            dynamic: format!("{PREFIX}-dynamic-{version}"),
            api: format!("{PREFIX}-api-{version}"),
        }
    }

    /// Whether `name` is one of the current buckets.
    #[must_use]
    pub fn is_current(&self, name: &str) -> bool {
        [&self.static_assets, &self.dynamic, &self.api]
            .iter()
            .any(|b| b.as_str() == name)
    }
}

impl Default for Buckets {
    fn default() -> Self {
        Self::new(CACHE_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_carry_the_version() {
        let buckets = Buckets::new("v7");
        assert_eq!(buckets.static_assets, "stillwaters-static-v7");
        assert_eq!(buckets.dynamic, "stillwaters-dynamic-v7");
        assert_eq!(buckets.api, "stillwaters-api-v7");
    }

    #[test]
    fn only_current_names_are_allowed() {
        let buckets = Buckets::new("v2");
        assert!(buckets.is_current("stillwaters-api-v2"));
        assert!(!buckets.is_current("stillwaters-api-v1"));
        assert!(!buckets.is_current("other-cache"));
    }
}
