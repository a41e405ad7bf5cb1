use serde::{Deserialize, Serialize};

pub mod condition;
pub mod edit;
pub mod error;
pub mod pattern;

pub use condition::{
    Combinator, Condition, FilterLeaf, Operator, PartialCondition, PartialSimpleFilter,
    SimpleFilter,
};
pub use error::MalformedPatternError;

/// Identifies a column, possibly reached through a join.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRef {
    pub parent_column_id: u32,
    pub join_id: Option<u32>,
}

impl ColumnRef {
    pub fn new(parent_column_id: u32) -> Self {
        ColumnRef {
            parent_column_id,
            join_id: None,
        }
    }

    pub fn joined(parent_column_id: u32, join_id: u32) -> Self {
        ColumnRef {
            parent_column_id,
            join_id: Some(join_id),
        }
    }
}

impl From<u32> for ColumnRef {
    fn from(parent_column_id: u32) -> Self {
        ColumnRef::new(parent_column_id)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ViewId(pub u32);

/// Right hand side of a leaf condition, always kept in its backing (stringified) form.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
}

impl Literal {
    pub fn new(value: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::new(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal { value }
    }
}
