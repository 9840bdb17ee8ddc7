use std::collections::HashMap;

/// Disjoint-set forest over string keys with path compression and union by
/// size. Keys are added on first use.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    ids: HashMap<String, usize>,
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    fn id(&mut self, key: &str) -> usize {
        if let Some(id) = self.ids.get(key) {
            return *id;
        }
        let id = self.parent.len();
        self.ids.insert(key.to_string(), id);
        self.parent.push(id);
        self.size.push(1);
        id
    }

    fn root(&mut self, id: usize) -> usize {
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut current = id;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Representative id of the set containing `key`.
    pub fn find(&mut self, key: &str) -> usize {
        let id = self.id(key);
        self.root(id)
    }

    pub fn union(&mut self, a: &str, b: &str) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        let (large, small) = if self.size[root_a] >= self.size[root_b] {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent[small] = large;
        self.size[large] += self.size[small];
    }
}
