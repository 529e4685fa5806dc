use std::sync::{Arc, OnceLock};

/// Identifies one logical query across plugin calls.
///
/// The id is generated lazily and shared by every builder cloned from the
/// same chain, so a plugin sees the same id in `transform_query` and
/// `transform_result`.
#[derive(Debug, Clone, Default)]
pub struct QueryId(Arc<OnceLock<String>>);

impl QueryId {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        self.0.get_or_init(|| uuid::Uuid::new_v4().to_string())
    }
}

impl PartialEq for QueryId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.as_str() == other.as_str()
    }
}

impl Eq for QueryId {}

impl std::hash::Hash for QueryId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl std::fmt::Display for QueryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_id() {
        let id = QueryId::new();
        let copy = id.clone();
        assert_eq!(copy.as_str(), id.as_str());
        assert_ne!(QueryId::new(), id);
    }
}
