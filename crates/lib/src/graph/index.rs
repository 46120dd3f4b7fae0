//! Item addressing within a node.

use std::fmt;

use uuid::Uuid;

use crate::value::{IndexKey, Value};

/// Addresses either the whole value of a node or one of its items.
///
/// [`NodeIndex::Empty`] means "the node value itself" and is distinct from
/// the first item, `NodeIndex::from(0)`:
///
/// ```
/// # use quantum::NodeIndex;
/// assert!(NodeIndex::Empty.is_empty());
/// assert!(!NodeIndex::from(0).is_empty());
/// assert_ne!(NodeIndex::Empty, NodeIndex::from(0));
/// assert_eq!(NodeIndex::from(2).as_int(), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum NodeIndex {
    /// The whole node value
    #[default]
    Empty,
    /// A list position, dictionary key or set value
    Key(IndexKey),
}

impl NodeIndex {
    /// Returns true for [`NodeIndex::Empty`]
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeIndex::Empty)
    }

    /// The wrapped key, if any
    pub fn key(&self) -> Option<&IndexKey> {
        match self {
            NodeIndex::Empty => None,
            NodeIndex::Key(key) => Some(key),
        }
    }

    /// The wrapped integer, if the key is an integer
    pub fn as_int(&self) -> Option<i64> {
        self.key().and_then(IndexKey::as_int)
    }

    /// The wrapped key as a list position
    pub fn as_position(&self) -> Option<usize> {
        self.key().and_then(IndexKey::as_position)
    }

    /// The wrapped key as a value; `Null` for [`NodeIndex::Empty`]
    pub fn to_value(&self) -> Value {
        self.key().cloned().map_or(Value::Null, Value::from)
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeIndex::Empty => f.write_str("(empty)"),
            NodeIndex::Key(key) => write!(f, "[{key}]"),
        }
    }
}

impl From<IndexKey> for NodeIndex {
    fn from(key: IndexKey) -> Self {
        NodeIndex::Key(key)
    }
}

impl From<i64> for NodeIndex {
    fn from(n: i64) -> Self {
        NodeIndex::Key(IndexKey::Int(n))
    }
}

impl From<i32> for NodeIndex {
    fn from(n: i32) -> Self {
        NodeIndex::Key(IndexKey::Int(i64::from(n)))
    }
}

impl From<usize> for NodeIndex {
    fn from(n: usize) -> Self {
        NodeIndex::Key(IndexKey::Int(i64::try_from(n).unwrap_or(i64::MAX)))
    }
}

impl From<&str> for NodeIndex {
    fn from(key: &str) -> Self {
        NodeIndex::Key(IndexKey::Text(key.to_string()))
    }
}

impl From<String> for NodeIndex {
    fn from(key: String) -> Self {
        NodeIndex::Key(IndexKey::Text(key))
    }
}

impl From<Uuid> for NodeIndex {
    fn from(key: Uuid) -> Self {
        NodeIndex::Key(IndexKey::Guid(key))
    }
}
