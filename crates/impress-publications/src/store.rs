//! Record store with an optional grouping by item type.
//!
//! Grouping scans the records from last to first. Bucket order is therefore
//! the order in which each type is first seen from the end, and the items
//! inside a bucket are in reverse of their order in the source.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::record::Record;

/// Grouped view: type classifier to bucket, in enumeration order
pub type Groups = IndexMap<String, Bucket>;

/// How a store is currently grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GroupMode {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "type")]
    ByType,
    #[serde(rename = "collection")]
    ByCollection,
}

impl GroupMode {
    /// Whether the mode produces a grouped view
    pub fn is_grouped(&self) -> bool {
        !matches!(self, GroupMode::None)
    }
}

impl fmt::Display for GroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupMode::None => write!(f, "none"),
            GroupMode::ByType => write!(f, "type"),
            GroupMode::ByCollection => write!(f, "collection"),
        }
    }
}

impl FromStr for GroupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(GroupMode::None),
            "type" => Ok(GroupMode::ByType),
            "collection" | "collections" => Ok(GroupMode::ByCollection),
            other => Err(format!("unknown group mode: {}", other)),
        }
    }
}

/// Which buckets appear pre-expanded
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ExpandRepr", into = "ExpandRepr")]
pub enum Expand {
    /// Nothing is pre-expanded
    #[default]
    None,
    /// Every bucket is pre-expanded
    All,
    /// Only buckets with these keys are pre-expanded
    Types(BTreeSet<String>),
}

impl Expand {
    /// Expand the listed types
    pub fn types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expand::Types(types.into_iter().map(Into::into).collect())
    }

    /// Whether a bucket with this key should start expanded
    pub fn includes(&self, key: &str) -> bool {
        match self {
            Expand::None => false,
            Expand::All => true,
            Expand::Types(types) => types.contains(key),
        }
    }
}

impl FromStr for Expand {
    type Err = String;

    /// Parse `all`, or a comma-separated list of types
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "all" {
            return Ok(Expand::All);
        }
        let types: BTreeSet<String> = s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if types.is_empty() {
            Ok(Expand::None)
        } else {
            Ok(Expand::Types(types))
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ExpandRepr {
    Token(String),
    Types(Vec<String>),
}

impl TryFrom<ExpandRepr> for Expand {
    type Error = String;

    fn try_from(repr: ExpandRepr) -> Result<Self, Self::Error> {
        match repr {
            ExpandRepr::Token(s) if s == "all" => Ok(Expand::All),
            ExpandRepr::Token(s) if s.is_empty() => Ok(Expand::None),
            ExpandRepr::Token(s) => Ok(Expand::types([s])),
            ExpandRepr::Types(types) if types.is_empty() => Ok(Expand::None),
            ExpandRepr::Types(types) => Ok(Expand::types(types)),
        }
    }
}

impl From<Expand> for ExpandRepr {
    fn from(expand: Expand) -> Self {
        match expand {
            Expand::None => ExpandRepr::Types(Vec::new()),
            Expand::All => ExpandRepr::Token("all".to_string()),
            Expand::Types(types) => ExpandRepr::Types(types.into_iter().collect()),
        }
    }
}

/// A group of records sharing a type classifier
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// The shared type classifier
    pub key: String,
    /// Records of this type, last-listed first
    pub items: Vec<Record>,
    /// Whether the group is shown expanded initially
    pub expanded: bool,
}

impl Bucket {
    fn new(key: String, expanded: bool) -> Self {
        Self {
            key,
            items: Vec::new(),
            expanded,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The shape a store currently presents
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// The raw records in their original order
    Flat,
    /// Buckets keyed by type classifier
    Grouped(Groups),
}

/// Holds the raw records and their current view
#[derive(Debug, Clone)]
pub struct RecordStore {
    raw: Vec<Record>,
    view: View,
    mode: GroupMode,
}

impl RecordStore {
    /// Wrap records without validating them
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            raw: records,
            view: View::Flat,
            mode: GroupMode::None,
        }
    }

    /// Records as they were handed in, never reordered
    pub fn raw(&self) -> &[Record] {
        &self.raw
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// The grouping last applied
    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    /// The grouped view, if the store is grouped
    pub fn groups(&self) -> Option<&Groups> {
        match &self.view {
            View::Grouped(groups) => Some(groups),
            View::Flat => None,
        }
    }

    /// Number of elements [`iter`](Self::iter) yields
    pub fn len(&self) -> usize {
        match &self.view {
            View::Flat => self.raw.len(),
            View::Grouped(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Group records by their item type.
    ///
    /// Every call rebuilds the buckets from the raw records. If any record
    /// lacks a type the store is left untouched.
    pub fn group_by_type(&mut self, expand: &Expand) -> Result<(), StoreError> {
        let typed = self
            .raw
            .iter()
            .map(|record| match record.item_type() {
                Some(item_type) => Ok((item_type, record)),
                None => Err(StoreError::InvalidRecord {
                    key: record.key.clone(),
                    reason: "missing itemType".to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups = Groups::new();
        for (item_type, record) in typed.into_iter().rev() {
            groups
                .entry(item_type.to_string())
                .or_insert_with_key(|key| Bucket::new(key.clone(), expand.includes(key)))
                .items
                .push(record.clone());
        }

        tracing::debug!(
            records = self.raw.len(),
            buckets = groups.len(),
            "grouped records by type"
        );

        self.view = View::Grouped(groups);
        self.mode = GroupMode::ByType;
        Ok(())
    }

    /// Group records by top-level collection. Not supported.
    pub fn group_by_collections(&mut self) -> Result<(), StoreError> {
        Err(StoreError::Unimplemented("group_by_collections"))
    }

    /// Apply a grouping mode. `GroupMode::None` leaves the store as it is.
    pub fn group(&mut self, mode: GroupMode, expand: &Expand) -> Result<(), StoreError> {
        match mode {
            GroupMode::None => Ok(()),
            GroupMode::ByType => self.group_by_type(expand),
            GroupMode::ByCollection => self.group_by_collections(),
        }
    }

    /// First record whose key matches, by linear scan
    pub fn find(&self, key: &str) -> Option<&Record> {
        self.raw.iter().find(|r| r.key == key)
    }

    /// Iterate the current view: records when flat, `(key, bucket)` when grouped
    pub fn iter(&self) -> Entries<'_> {
        match &self.view {
            View::Flat => Entries::Flat(self.raw.iter()),
            View::Grouped(groups) => Entries::Grouped(groups.iter()),
        }
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = Entry<'a>;
    type IntoIter = Entries<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One element of a store's view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entry<'a> {
    /// A record of a flat store
    Record(&'a Record),
    /// A bucket of a grouped store with its key
    Group(&'a str, &'a Bucket),
}

/// Iterator over a store's view
#[derive(Debug, Clone)]
pub enum Entries<'a> {
    Flat(std::slice::Iter<'a, Record>),
    Grouped(indexmap::map::Iter<'a, String, Bucket>),
}

impl<'a> Iterator for Entries<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Entries::Flat(iter) => iter.next().map(Entry::Record),
            Entries::Grouped(iter) => iter
                .next()
                .map(|(key, bucket)| Entry::Group(key.as_str(), bucket)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Entries::Flat(iter) => iter.size_hint(),
            Entries::Grouped(iter) => iter.size_hint(),
        }
    }
}

impl ExactSizeIterator for Entries<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordStore {
        RecordStore::new(vec![
            Record::new("A", "book"),
            Record::new("B", "journalArticle"),
            Record::new("C", "book"),
        ])
    }

    fn keys(bucket: &Bucket) -> Vec<&str> {
        bucket.items.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn test_new_store_is_flat() {
        let store = sample();
        assert_eq!(store.mode(), GroupMode::None);
        assert_eq!(store.view(), &View::Flat);
        assert!(store.groups().is_none());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_group_by_type_reverse_scan() {
        let mut store = sample();
        store.group_by_type(&Expand::types(["book"])).unwrap();

        assert_eq!(store.mode(), GroupMode::ByType);
        let groups = store.groups().unwrap();
        let order: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["book", "journalArticle"]);

        assert_eq!(keys(&groups["book"]), vec!["C", "A"]);
        assert!(groups["book"].expanded);
        assert_eq!(keys(&groups["journalArticle"]), vec!["B"]);
        assert!(!groups["journalArticle"].expanded);
    }

    #[test]
    fn test_bucket_order_follows_last_occurrence() {
        let mut store = RecordStore::new(vec![
            Record::new("A", "book"),
            Record::new("B", "thesis"),
            Record::new("C", "journalArticle"),
            Record::new("D", "thesis"),
        ]);
        store.group_by_type(&Expand::None).unwrap();
        let order: Vec<&str> = store.groups().unwrap().keys().map(String::as_str).collect();
        assert_eq!(order, vec!["thesis", "journalArticle", "book"]);
    }

    #[test]
    fn test_regroup_recomputes_expansion() {
        let mut store = sample();
        store.group_by_type(&Expand::All).unwrap();
        assert!(store.groups().unwrap().values().all(|b| b.expanded));

        store.group_by_type(&Expand::None).unwrap();
        let groups = store.groups().unwrap();
        assert!(groups.values().all(|b| !b.expanded));
        assert_eq!(groups["book"].len(), 2);
    }

    #[test]
    fn test_group_rejects_untyped_record() {
        let mut store = RecordStore::new(vec![Record::new("A", "book"), Record::new("B", "")]);
        let err = store.group_by_type(&Expand::All).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidRecord {
                key: "B".into(),
                reason: "missing itemType".into()
            }
        );
        assert_eq!(store.mode(), GroupMode::None);
        assert_eq!(store.view(), &View::Flat);
    }

    #[test]
    fn test_group_reports_first_untyped_record() {
        let mut store = RecordStore::new(vec![
            Record::new("A", ""),
            Record::new("B", "book"),
            Record::new("C", ""),
        ]);
        let err = store.group_by_type(&Expand::None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { ref key, .. } if key == "A"));
        assert!(store.groups().is_none());
    }

    #[test]
    fn test_group_by_collections_unimplemented() {
        let mut store = sample();
        assert_eq!(
            store.group_by_collections(),
            Err(StoreError::Unimplemented("group_by_collections"))
        );
        assert_eq!(store.mode(), GroupMode::None);

        store.group_by_type(&Expand::None).unwrap();
        assert!(store.group(GroupMode::ByCollection, &Expand::All).is_err());
        assert_eq!(store.mode(), GroupMode::ByType);
    }

    #[test]
    fn test_iterate_flat_then_grouped() {
        let mut store = sample();
        let flat: Vec<&str> = store
            .iter()
            .map(|e| match e {
                Entry::Record(r) => r.key.as_str(),
                Entry::Group(..) => panic!("flat store yielded a group"),
            })
            .collect();
        assert_eq!(flat, vec!["A", "B", "C"]);

        store.group_by_type(&Expand::None).unwrap();
        let mut iter = store.iter();
        assert_eq!(iter.len(), 2);
        assert!(matches!(iter.next(), Some(Entry::Group("book", _))));
        assert!(matches!(iter.next(), Some(Entry::Group("journalArticle", _))));
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());

        // A fresh iterator starts over
        assert_eq!(store.iter().count(), 2);
        assert_eq!((&store).into_iter().count(), 2);
    }

    #[test]
    fn test_find_first_match() {
        let store = RecordStore::new(vec![
            Record::new("A", "book").with_field("title", "first"),
            Record::new("A", "book").with_field("title", "second"),
        ]);
        assert_eq!(store.find("A").map(|r| r.title()), Some("first".to_string()));
        assert!(store.find("Z").is_none());
    }

    #[test]
    fn test_expand_parsing() {
        assert_eq!("all".parse::<Expand>(), Ok(Expand::All));
        assert_eq!("".parse::<Expand>(), Ok(Expand::None));
        assert_eq!(
            "book, thesis".parse::<Expand>(),
            Ok(Expand::types(["book", "thesis"]))
        );
        assert!(!Expand::None.includes("book"));
    }

    #[test]
    fn test_expand_serde() {
        let all: Expand = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, Expand::All);
        let one: Expand = serde_json::from_str("\"book\"").unwrap();
        assert_eq!(one, Expand::types(["book"]));
        let list: Expand = serde_json::from_str("[\"book\", \"thesis\"]").unwrap();
        assert!(list.includes("thesis"));
        assert_eq!(serde_json::to_string(&Expand::All).unwrap(), "\"all\"");
    }

    #[test]
    fn test_group_mode_parsing() {
        assert_eq!("type".parse::<GroupMode>(), Ok(GroupMode::ByType));
        assert_eq!("none".parse::<GroupMode>(), Ok(GroupMode::None));
        assert!("author".parse::<GroupMode>().is_err());
        assert_eq!(GroupMode::ByCollection.to_string(), "collection");
    }
}
