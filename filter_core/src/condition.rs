//! Boolean filter expressions over table columns.
//!
//! A [`Condition`] is generic over its leaf so the same skeleton carries both complete filters
//! ([`SimpleFilter`], safe to hand to the view data service) and the editor's in-progress
//! [`PartialSimpleFilter`] leaves.

use crate::error::MalformedPatternError;
use crate::pattern::{pack, unpack};
use crate::{ColumnRef, Literal};
use serde::{Deserialize, Serialize};

#[derive(
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum Operator {
    #[default]
    #[strum(to_string = "=")]
    #[serde(rename = "=")]
    Eq,
    #[strum(to_string = "!=")]
    #[serde(rename = "!=")]
    NotEq,
    #[strum(to_string = "<")]
    #[serde(rename = "<")]
    Lt,
    #[strum(to_string = ">")]
    #[serde(rename = ">")]
    Gt,
    #[strum(to_string = "<=")]
    #[serde(rename = "<=")]
    LtEq,
    #[strum(to_string = ">=")]
    #[serde(rename = ">=")]
    GtEq,
    /// Substring match, right hand side is a packed pattern, see [`crate::pattern`].
    #[strum(to_string = "LIKE")]
    #[serde(rename = "LIKE")]
    Like,
}

/// Binary node kind used when a leaf is promoted into a compound condition.
#[derive(
    strum::EnumIter, strum::Display, Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn combine<L>(self, left: Condition<L>, right: Condition<L>) -> Condition<L> {
        match self {
            Combinator::And => and(left, right),
            Combinator::Or => or(left, right),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Condition<L = SimpleFilter> {
    Infix(L),
    Not {
        condition: Box<Condition<L>>,
    },
    And {
        left: Box<Condition<L>>,
        right: Box<Condition<L>>,
    },
    Or {
        left: Box<Condition<L>>,
        right: Box<Condition<L>>,
    },
}

pub type PartialCondition = Condition<PartialSimpleFilter>;

/// Complete leaf: every part is present.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SimpleFilter {
    pub left: ColumnRef,
    pub operator: Operator,
    pub right: Literal,
}

/// Leaf being edited: the user may not have picked a column or typed a value yet.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PartialSimpleFilter {
    pub left: Option<ColumnRef>,
    pub operator: Operator,
    pub right: Option<Literal>,
}

/// Uniform read access to both leaf kinds.
pub trait FilterLeaf {
    fn column(&self) -> Option<ColumnRef>;
    fn operator(&self) -> Operator;
    fn value(&self) -> Option<&str>;
}

impl FilterLeaf for SimpleFilter {
    fn column(&self) -> Option<ColumnRef> {
        Some(self.left)
    }

    fn operator(&self) -> Operator {
        self.operator
    }

    fn value(&self) -> Option<&str> {
        Some(self.right.value.as_str())
    }
}

impl FilterLeaf for PartialSimpleFilter {
    fn column(&self) -> Option<ColumnRef> {
        self.left
    }

    fn operator(&self) -> Operator {
        self.operator
    }

    fn value(&self) -> Option<&str> {
        self.right.as_ref().map(|r| r.value.as_str())
    }
}

impl SimpleFilter {
    pub fn new(left: ColumnRef, operator: Operator, right: impl Into<Literal>) -> Self {
        SimpleFilter {
            left,
            operator,
            right: right.into(),
        }
    }
}

impl From<SimpleFilter> for PartialSimpleFilter {
    fn from(value: SimpleFilter) -> Self {
        PartialSimpleFilter {
            left: Some(value.left),
            operator: value.operator,
            right: Some(value.right),
        }
    }
}

impl PartialSimpleFilter {
    /// Leaf with no column and no value.
    pub fn empty(operator: Operator) -> Self {
        PartialSimpleFilter {
            left: None,
            operator,
            right: None,
        }
    }

    /// True when column, operator and a non-empty value are all present.
    pub fn is_valid_filter(&self) -> bool {
        self.left.is_some() && self.right.as_ref().is_some_and(|r| !r.is_empty())
    }

    pub fn to_complete(&self) -> Option<SimpleFilter> {
        if !self.is_valid_filter() {
            return None;
        }
        Some(SimpleFilter {
            left: self.left?,
            operator: self.operator,
            right: self.right.clone()?,
        })
    }

    pub fn with_column(mut self, column: ColumnRef) -> Self {
        self.left = Some(column);
        self
    }

    /// Switch operator, re-encoding the entered value so that what the user typed stays the same.
    pub fn with_operator(self, operator: Operator) -> Self {
        if operator == self.operator {
            return self;
        }
        let user_value = match self.user_value() {
            Ok(v) => v,
            Err(_) => self.right.as_ref().map(|r| r.value.clone()),
        };
        let next = PartialSimpleFilter {
            operator,
            right: None,
            ..self
        };
        match user_value {
            Some(v) => next.with_user_value(v),
            None => next,
        }
    }

    /// Store a value as typed by the user. `LIKE` leaves keep it packed.
    pub fn with_user_value(mut self, value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        self.right = Some(match self.operator {
            Operator::Like => Literal::new(pack(value)),
            _ => Literal::new(value),
        });
        self
    }

    /// Value as the user should see it, `LIKE` patterns are unpacked.
    pub fn user_value(&self) -> Result<Option<String>, MalformedPatternError> {
        let Some(right) = &self.right else {
            return Ok(None);
        };
        match self.operator {
            Operator::Like => unpack(&right.value).map(Some),
            _ => Ok(Some(right.value.clone())),
        }
    }
}

pub fn infix(left: ColumnRef, operator: Operator, right: impl Into<Literal>) -> Condition {
    Condition::Infix(SimpleFilter::new(left, operator, right))
}

pub fn not<L>(condition: Condition<L>) -> Condition<L> {
    Condition::Not {
        condition: Box::new(condition),
    }
}

pub fn and<L>(left: Condition<L>, right: Condition<L>) -> Condition<L> {
    Condition::And {
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn or<L>(left: Condition<L>, right: Condition<L>) -> Condition<L> {
    Condition::Or {
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Rebuild `condition` with every leaf replaced by `transform(leaf)`.
pub fn map_leaves<L, M>(transform: impl FnMut(&L) -> M, condition: &Condition<L>) -> Condition<M> {
    condition.map_leaves(transform)
}

impl<L> Condition<L> {
    pub fn leaf(leaf: L) -> Self {
        Condition::Infix(leaf)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Condition::Infix(_))
    }

    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            Condition::Infix(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn map_leaves<M>(&self, mut transform: impl FnMut(&L) -> M) -> Condition<M> {
        self.map_leaves_inner(&mut transform)
    }

    fn map_leaves_inner<M>(&self, transform: &mut impl FnMut(&L) -> M) -> Condition<M> {
        match self {
            Condition::Infix(leaf) => Condition::Infix(transform(leaf)),
            Condition::Not { condition } => not(condition.map_leaves_inner(transform)),
            Condition::And { left, right } => and(
                left.map_leaves_inner(transform),
                right.map_leaves_inner(transform),
            ),
            Condition::Or { left, right } => or(
                left.map_leaves_inner(transform),
                right.map_leaves_inner(transform),
            ),
        }
    }

    /// Number of leaves, for logging.
    pub fn leaf_count(&self) -> usize {
        match self {
            Condition::Infix(_) => 1,
            Condition::Not { condition } => condition.leaf_count(),
            Condition::And { left, right } | Condition::Or { left, right } => {
                left.leaf_count() + right.leaf_count()
            }
        }
    }
}

impl Condition<SimpleFilter> {
    /// Editable copy of a complete (e.g. persisted) condition.
    pub fn to_partial(&self) -> PartialCondition {
        self.map_leaves(|leaf| PartialSimpleFilter::from(leaf.clone()))
    }
}

impl PartialCondition {
    /// Fresh `Infix` leaf without column and value.
    pub fn empty_leaf(operator: Operator) -> Self {
        Condition::Infix(PartialSimpleFilter::empty(operator))
    }
}
