use std::fmt;

/// Ordered cache key: a resource name followed by scoping ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(resource: impl Into<String>) -> Self {
        Self(vec![resource.into()])
    }

    pub fn with(mut self, part: impl Into<String>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn resource(&self) -> &str {
        &self.0[0]
    }

    /// Prefix match used by invalidation: `["people"]` covers
    /// `["people", "c1"]` and `["people", "c1", "p1"]`.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        let all = QueryKey::new("people");
        let scoped = QueryKey::new("people").with("c1");
        let item = QueryKey::new("people").with("c1").with("p1");

        assert!(item.starts_with(&all));
        assert!(item.starts_with(&scoped));
        assert!(!scoped.starts_with(&item));
        assert!(!QueryKey::new("teams").starts_with(&all));
        assert!(!QueryKey::new("peoples").starts_with(&all));
    }

    #[test]
    fn test_order_matters() {
        let a = QueryKey::new("schedules").with("c1").with("sv1");
        let b = QueryKey::new("schedules").with("sv1").with("c1");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "[schedules, c1, sv1]");
        assert_eq!(a.resource(), "schedules");
    }
}
