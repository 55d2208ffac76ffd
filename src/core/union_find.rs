use std::collections::HashMap;

/// Disjoint-set over string item ids, scoped to a single detection run.
///
/// Plain parent-map representation with path halving on `find`. Every id is
/// registered as its own singleton before any merge, so after all unions each
/// registered id belongs to exactly one set.
#[derive(Debug, Default)]
pub struct UnionFind {
    parent: HashMap<String, String>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an id as its own singleton set. Re-inserting is a no-op.
    pub fn insert(&mut self, id: &str) {
        if !self.parent.contains_key(id) {
            self.parent.insert(id.to_string(), id.to_string());
        }
    }

    /// Root of the set containing `id`, halving the path as it walks.
    pub fn find(&mut self, id: &str) -> String {
        let mut current = id.to_string();
        loop {
            let parent = match self.parent.get(&current) {
                Some(p) if *p != current => p.clone(),
                _ => return current,
            };
            let grandparent = self
                .parent
                .get(&parent)
                .cloned()
                .unwrap_or_else(|| parent.clone());
            self.parent.insert(current, grandparent.clone());
            current = grandparent;
        }
    }

    /// Merge the sets containing `a` and `b`: the root of `a` attaches under
    /// the root of `b`.
    pub fn union(&mut self, a: &str, b: &str) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent.insert(root_a, root_b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons_are_their_own_root() {
        let mut sets = UnionFind::new();
        sets.insert("a");
        sets.insert("b");

        assert_eq!(sets.find("a"), "a");
        assert_eq!(sets.find("b"), "b");
    }

    #[test]
    fn test_union_merges_sets() {
        let mut sets = UnionFind::new();
        sets.insert("a");
        sets.insert("b");
        sets.insert("c");

        sets.union("a", "b");
        assert_eq!(sets.find("a"), sets.find("b"));
        assert_ne!(sets.find("a"), sets.find("c"));
    }

    #[test]
    fn test_transitive_union() {
        let mut sets = UnionFind::new();
        for id in ["a", "b", "c", "d"] {
            sets.insert(id);
        }

        sets.union("a", "b");
        sets.union("c", "d");
        sets.union("b", "c");

        let root = sets.find("a");
        for id in ["b", "c", "d"] {
            assert_eq!(sets.find(id), root);
        }
    }

    #[test]
    fn test_union_is_idempotent() {
        let mut sets = UnionFind::new();
        sets.insert("a");
        sets.insert("b");

        sets.union("a", "b");
        let root = sets.find("a");
        sets.union("a", "b");
        sets.union("b", "a");

        assert_eq!(sets.find("a"), root);
        assert_eq!(sets.find("b"), root);
    }

    #[test]
    fn test_reinsert_does_not_split() {
        let mut sets = UnionFind::new();
        sets.insert("a");
        sets.insert("b");
        sets.union("a", "b");

        sets.insert("a");
        assert_eq!(sets.find("a"), sets.find("b"));
    }
}
