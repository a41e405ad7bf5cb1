//! Structural edits over condition trees. Every function returns a new tree.

use crate::condition::{
    Combinator, Condition, FilterLeaf, Operator, PartialCondition, PartialSimpleFilter,
    SimpleFilter, and, not, or,
};

/// Reduce a partial tree to its largest complete sub-expression.
///
/// Invalid leaves vanish. Under `And` and `Or` alike a vanished operand is dropped and its valid
/// sibling replaces the node, so an unfinished row never restricts what is shown. A `Not` over nothing is nothing. `None` means there is no filter to apply.
pub fn strip(partial: &PartialCondition) -> Option<Condition<SimpleFilter>> {
    match partial {
        Condition::Infix(leaf) => leaf.to_complete().map(Condition::Infix),
        Condition::Not { condition } => strip(condition).map(not),
        Condition::And { left, right } => strip_binary(left, right, and),
        Condition::Or { left, right } => strip_binary(left, right, or),
    }
}

fn strip_binary(
    left: &PartialCondition,
    right: &PartialCondition,
    combine: fn(Condition, Condition) -> Condition,
) -> Option<Condition> {
    match (strip(left), strip(right)) {
        (Some(left), Some(right)) => Some(combine(left, right)),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

/// True for `Not(leaf)`, `And(leaf, leaf)` and `Or(leaf, leaf)`; these are the only nodes
/// that can be demoted.
pub fn has_only_leaf_children<L>(condition: &Condition<L>) -> bool {
    match condition {
        Condition::Infix(_) => false,
        Condition::Not { condition } => condition.is_leaf(),
        Condition::And { left, right } | Condition::Or { left, right } => {
            left.is_leaf() && right.is_leaf()
        }
    }
}

/// Collapse a node with leaf children back into a single leaf.
///
/// `Not(leaf)` gives `leaf` (the negation is dropped with the node). For `And`/`Or` the right
/// leaf is kept only when it is valid and the left one is not.
pub fn demote(condition: &PartialCondition) -> Option<PartialCondition> {
    if !has_only_leaf_children(condition) {
        return None;
    }
    match condition {
        Condition::Infix(_) => None,
        Condition::Not { condition } => Some(condition.as_ref().clone()),
        Condition::And { left, right } | Condition::Or { left, right } => {
            let left_valid = left.as_leaf().is_some_and(PartialSimpleFilter::is_valid_filter);
            let right_valid = right.as_leaf().is_some_and(PartialSimpleFilter::is_valid_filter);
            if right_valid && !left_valid {
                Some(right.as_ref().clone())
            } else {
                Some(left.as_ref().clone())
            }
        }
    }
}

/// Wrap `leaf` as the left operand of `combinator`, with a fresh empty leaf on the right.
pub fn promote(
    leaf: PartialCondition,
    combinator: Combinator,
    default_operator: Operator,
) -> PartialCondition {
    combinator.combine(leaf, PartialCondition::empty_leaf(default_operator))
}

/// Positional deep equality: leaves compare column, operator and value; `And(x, y)` differs
/// from `And(y, x)`.
pub fn structural_equals<L: FilterLeaf>(a: &Condition<L>, b: &Condition<L>) -> bool {
    match (a, b) {
        (Condition::Infix(a), Condition::Infix(b)) => {
            a.column() == b.column() && a.operator() == b.operator() && a.value() == b.value()
        }
        (Condition::Not { condition: a }, Condition::Not { condition: b }) => {
            structural_equals(a, b)
        }
        (
            Condition::And {
                left: a_left,
                right: a_right,
            },
            Condition::And {
                left: b_left,
                right: b_right,
            },
        )
        | (
            Condition::Or {
                left: a_left,
                right: a_right,
            },
            Condition::Or {
                left: b_left,
                right: b_right,
            },
        ) => structural_equals(a_left, b_left) && structural_equals(a_right, b_right),
        _ => false,
    }
}

/// Same length and pairwise [`structural_equals`] in order.
pub fn filters_equal<L: FilterLeaf>(a: &[Condition<L>], b: &[Condition<L>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| structural_equals(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnRef;
    use crate::condition::infix;

    fn leaf(col: u32, value: &str) -> PartialCondition {
        Condition::Infix(
            PartialSimpleFilter::empty(Operator::Eq)
                .with_column(ColumnRef::new(col))
                .with_user_value(value),
        )
    }

    fn empty() -> PartialCondition {
        PartialCondition::empty_leaf(Operator::Eq)
    }

    #[test]
    fn strip_keeps_complete_tree() {
        let tree = or(leaf(1, "a"), not(leaf(2, "b")));
        assert_eq!(
            strip(&tree),
            Some(or(
                infix(ColumnRef::new(1), Operator::Eq, "a"),
                not(infix(ColumnRef::new(2), Operator::Eq, "b"))
            ))
        );
    }

    #[test]
    fn strip_drops_invalid_operand_of_or() {
        assert_eq!(
            strip(&or(empty(), leaf(3, "x"))),
            Some(infix(ColumnRef::new(3), Operator::Eq, "x"))
        );
    }

    #[test]
    fn strip_replaces_node_with_valid_sibling() {
        let tree = not(and(leaf(1, "a"), empty()));
        assert_eq!(
            strip(&tree),
            Some(not(infix(ColumnRef::new(1), Operator::Eq, "a")))
        );
    }

    #[test]
    fn strip_nested_all_invalid() {
        let tree = and(not(empty()), or(empty(), leaf(1, "")));
        assert_eq!(strip(&tree), None);
    }

    #[test]
    fn demote_prefers_valid_right() {
        assert_eq!(demote(&and(empty(), leaf(2, "b"))), Some(leaf(2, "b")));
        assert_eq!(demote(&or(leaf(1, "a"), leaf(2, "b"))), Some(leaf(1, "a")));
        assert_eq!(demote(&or(empty(), empty())), Some(empty()));
        assert_eq!(demote(&not(leaf(1, "a"))), Some(leaf(1, "a")));
    }

    #[test]
    fn demote_refuses_deep_nodes() {
        assert_eq!(demote(&leaf(1, "a")), None);
        assert_eq!(demote(&and(not(leaf(1, "a")), leaf(2, "b"))), None);
        assert_eq!(demote(&not(not(leaf(1, "a")))), None);
    }

    #[test]
    fn promote_uses_combinator() {
        assert_eq!(
            promote(leaf(1, "a"), Combinator::Or, Operator::Eq),
            or(leaf(1, "a"), empty())
        );
    }

    #[test]
    fn equality_is_positional() {
        let x = leaf(1, "a");
        let y = leaf(2, "b");
        assert!(structural_equals(&and(x.clone(), y.clone()), &and(x.clone(), y.clone())));
        assert!(!structural_equals(&and(x.clone(), y.clone()), &and(y.clone(), x.clone())));
        assert!(!structural_equals(&and(x.clone(), y.clone()), &or(x.clone(), y.clone())));
        assert!(!structural_equals(&x, &not(x.clone())));
    }

    #[test]
    fn joined_columns_differ() {
        let a = Condition::Infix(SimpleFilter::new(
            ColumnRef::joined(1, 9),
            Operator::Eq,
            "v",
        ));
        let b = infix(ColumnRef::new(1), Operator::Eq, "v");
        assert!(!structural_equals(&a, &b));
        assert!(filters_equal(&[b.clone()], &[b.clone()]));
        assert!(!filters_equal(&[b.clone()], &[b.clone(), b]));
    }
}
