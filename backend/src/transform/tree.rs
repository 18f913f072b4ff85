//! Nested result tree and deep merge.
//!
//! ```text
//! { "Asia":                        ← first grouping field
//!     { "Offline":                 ← second grouping field
//!         [ {leaf}, {leaf} ] } }   ← leaf records
//! ```

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::models::FieldValue;

/// One output record: output field name → scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeafRecord(BTreeMap<String, FieldValue>);

impl LeafRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.0.insert(field.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for LeafRecord {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Grouped output: branches keyed by grouping values, leaf lists at the bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultTree {
    Branch(BTreeMap<String, ResultTree>),
    Leaves(Vec<LeafRecord>),
}

impl Default for ResultTree {
    fn default() -> Self {
        ResultTree::Branch(BTreeMap::new())
    }
}

impl ResultTree {
    /// An empty branch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-path tree `{path[0]: {path[1]: ... leaves}}`.
    ///
    /// An empty path yields the leaves themselves.
    pub fn from_path<S: AsRef<str>>(path: &[S], leaves: Vec<LeafRecord>) -> Self {
        path.iter()
            .rev()
            .fold(ResultTree::Leaves(leaves), |child, key| {
                ResultTree::Branch(BTreeMap::from([(key.as_ref().to_string(), child)]))
            })
    }

    /// Deep-merge `source` into `self`.
    ///
    /// Keys missing from `self` are copied; keys where both sides are
    /// branches are merged recursively; any other collision is overwritten by
    /// `source`. `self` is modified in place and `source` is consumed.
    pub fn merge(&mut self, source: ResultTree) {
        match (self, source) {
            (ResultTree::Branch(target), ResultTree::Branch(branches)) => {
                for (key, subtree) in branches {
                    match target.entry(key) {
                        Entry::Vacant(slot) => {
                            slot.insert(subtree);
                        }
                        Entry::Occupied(mut slot) => slot.get_mut().merge(subtree),
                    }
                }
            }
            (target, source) => *target = source,
        }
    }

    /// Owned variant of [`ResultTree::merge`].
    pub fn merged(mut self, source: ResultTree) -> Self {
        self.merge(source);
        self
    }

    /// Follow `path` down the branches.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&ResultTree> {
        path.iter().try_fold(self, |node, key| match node {
            ResultTree::Branch(children) => children.get(key.as_ref()),
            ResultTree::Leaves(_) => None,
        })
    }

    /// Leaf records at `path`, if the path ends on a leaf list.
    pub fn leaves_at<S: AsRef<str>>(&self, path: &[S]) -> Option<&[LeafRecord]> {
        match self.get(path)? {
            ResultTree::Leaves(leaves) => Some(leaves),
            ResultTree::Branch(_) => None,
        }
    }

    /// Top-level keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            ResultTree::Branch(children) => children.keys().map(String::as_str).collect(),
            ResultTree::Leaves(_) => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ResultTree::Branch(children) => children.is_empty(),
            ResultTree::Leaves(leaves) => leaves.is_empty(),
        }
    }

    /// Total number of leaf records in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            ResultTree::Branch(children) => children.values().map(ResultTree::leaf_count).sum(),
            ResultTree::Leaves(leaves) => leaves.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(country: &str, item: &str) -> LeafRecord {
        [
            ("Country", FieldValue::from(country)),
            ("ItemType", FieldValue::from(item)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_from_path() {
        let tree = ResultTree::from_path(&["Asia", "Offline"], vec![leaf("Japan", "Cereal")]);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({"Asia": {"Offline": [{"Country": "Japan", "ItemType": "Cereal"}]}})
        );
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_merge_keeps_sibling_branches() {
        let mut data_one = ResultTree::from_path(&["Asia", "Online"], vec![leaf("Japan", "Cosmetics")]);
        let data_two = ResultTree::from_path(
            &["Asia", "Offline"],
            vec![leaf("Japan", "Cereal"), leaf("Japan", "Baby Food")],
        );

        data_one.merge(data_two);

        assert_eq!(
            serde_json::to_value(&data_one).unwrap(),
            json!({"Asia": {
                "Online": [{"Country": "Japan", "ItemType": "Cosmetics"}],
                "Offline": [
                    {"Country": "Japan", "ItemType": "Cereal"},
                    {"Country": "Japan", "ItemType": "Baby Food"}
                ]
            }})
        );
        assert_eq!(data_one.keys(), vec!["Asia"]);
    }

    #[test]
    fn test_merge_collision_overwrites() {
        let mut target = ResultTree::from_path(&["Asia"], vec![leaf("Japan", "Cereal")]);
        let source = ResultTree::from_path(&["Asia"], vec![leaf("India", "Fruits")]);
        target.merge(source);
        let leaves = target.leaves_at(&["Asia"]).unwrap();
        assert_eq!(leaves, &[leaf("India", "Fruits")]);
    }

    #[test]
    fn test_merge_into_empty() {
        let tree = ResultTree::new().merged(ResultTree::from_path(&["Europe"], vec![leaf("France", "Fruits")]));
        assert_eq!(tree.keys(), vec!["Europe"]);
        assert!(!tree.is_empty());
        assert!(ResultTree::new().is_empty());
    }

    #[test]
    fn test_get_paths() {
        let tree = ResultTree::from_path(&["Asia", "Offline"], vec![leaf("Japan", "Cereal")]);
        assert!(tree.get(&["Asia"]).is_some());
        assert!(tree.leaves_at(&["Asia"]).is_none());
        assert_eq!(tree.leaves_at(&["Asia", "Offline"]).unwrap().len(), 1);
        assert!(tree.get(&["Asia", "Offline", "deeper"]).is_none());
        assert!(tree.get(&["Europe"]).is_none());
    }

    #[test]
    fn test_roundtrip_from_json() {
        let doc = json!({"Asia": {"Offline": [{"Country": "Japan", "UnitsSold": 10}]}});
        let tree: ResultTree = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(serde_json::to_value(&tree).unwrap(), doc);
    }
}
