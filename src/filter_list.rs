use crate::config::FilterEditorConfig;
use filter_core::edit::{demote, promote, strip};
use filter_core::{Combinator, Condition, Operator, PartialCondition};
use log::trace;
use serde::{Deserialize, Serialize};
use tap::Tap;

/// Identity of an editor row. Only used to track rows across re-renders, never persisted.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct FilterKey(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyedFilter {
    pub key: FilterKey,
    pub condition: PartialCondition,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterEvent {
    /// Append an empty row.
    Add,
    Remove(FilterKey),
    Replace(FilterKey, PartialCondition),
    /// Turn a simple row into a compound one using the default combinator.
    Promote(FilterKey),
    PromoteWith(FilterKey, Combinator),
    /// Collapse a compound row whose children are all leaves.
    Demote(FilterKey),
}

/// Ordered top-level filters of one editor.
///
/// Transitions consume the state and return the next one; events that name an unknown key
/// leave it untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterListState {
    filters: Vec<KeyedFilter>,
    next_key: FilterKey,
    default_operator: Operator,
    default_combinator: Combinator,
}

impl FilterListState {
    /// Seed from persisted filters, or with one empty row if there are none.
    pub fn initialize(persisted: &[Condition], config: &FilterEditorConfig) -> Self {
        let state = FilterListState {
            filters: Vec::with_capacity(persisted.len().max(1)),
            next_key: FilterKey(0),
            default_operator: config.default_operator,
            default_combinator: config.default_combinator,
        };
        if persisted.is_empty() {
            return state.push(PartialCondition::empty_leaf(config.default_operator));
        }
        persisted
            .iter()
            .fold(state, |state, condition| state.push(condition.to_partial()))
    }

    pub fn apply(self, event: FilterEvent) -> Self {
        trace!("FilterList: {event:?}");
        match event {
            FilterEvent::Add => {
                let empty = PartialCondition::empty_leaf(self.default_operator);
                self.push(empty)
            }
            FilterEvent::Remove(key) => {
                self.tap_mut(|state| state.filters.retain(|f| f.key != key))
            }
            FilterEvent::Replace(key, condition) => self.modify(key, |_| Some(condition)),
            FilterEvent::Promote(key) => {
                let combinator = self.default_combinator;
                self.apply(FilterEvent::PromoteWith(key, combinator))
            }
            FilterEvent::PromoteWith(key, combinator) => {
                let default_operator = self.default_operator;
                self.modify(key, |current| {
                    current
                        .is_leaf()
                        .then(|| promote(current.clone(), combinator, default_operator))
                })
            }
            FilterEvent::Demote(key) => self.modify(key, demote),
        }
    }

    fn push(mut self, condition: PartialCondition) -> Self {
        self.filters.push(KeyedFilter {
            key: self.next_key,
            condition,
        });
        self.next_key = FilterKey(self.next_key.0 + 1);
        self
    }

    /// Substitute the condition at `key` if `update` produces one.
    fn modify(
        mut self,
        key: FilterKey,
        update: impl FnOnce(&PartialCondition) -> Option<PartialCondition>,
    ) -> Self {
        let Some(entry) = self.filters.iter_mut().find(|f| f.key == key) else {
            trace!("FilterList: no row with key {key:?}");
            return self;
        };
        if let Some(condition) = update(&entry.condition) {
            entry.condition = condition;
        }
        self
    }

    pub fn filters(&self) -> &[KeyedFilter] {
        &self.filters
    }

    pub fn get(&self, key: FilterKey) -> Option<&PartialCondition> {
        self.filters
            .iter()
            .find(|f| f.key == key)
            .map(|f| &f.condition)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Complete filters to persist, in row order. Rows that strip to nothing are skipped.
    pub fn extract_complete(&self) -> Vec<Condition> {
        self.filters
            .iter()
            .filter_map(|f| strip(&f.condition))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filter_core::condition::infix;
    use filter_core::ColumnRef;

    #[test]
    fn keys_increase_across_add_and_remove() {
        let state = FilterListState::initialize(&[], &FilterEditorConfig::default())
            .apply(FilterEvent::Add)
            .apply(FilterEvent::Remove(FilterKey(1)))
            .apply(FilterEvent::Add);
        let keys: Vec<_> = state.filters().iter().map(|f| f.key).collect();
        assert_eq!(keys, [FilterKey(0), FilterKey(2)]);
    }

    #[test]
    fn promote_only_applies_to_leaves() {
        let persisted = [infix(ColumnRef::new(1), Operator::Eq, "a")];
        let state = FilterListState::initialize(&persisted, &FilterEditorConfig::default())
            .apply(FilterEvent::Promote(FilterKey(0)));
        let promoted = state.clone();
        assert!(matches!(state.get(FilterKey(0)), Some(Condition::And { .. })));
        let state = state.apply(FilterEvent::Promote(FilterKey(0)));
        assert_eq!(state, promoted);
    }

    #[test]
    fn replace_keeps_order_and_neighbours() {
        let persisted = [
            infix(ColumnRef::new(1), Operator::Eq, "a"),
            infix(ColumnRef::new(2), Operator::Gt, "3"),
            infix(ColumnRef::new(3), Operator::Like, "%x%"),
        ];
        let before = FilterListState::initialize(&persisted, &FilterEditorConfig::default());
        let replacement = PartialCondition::empty_leaf(Operator::Lt);
        let state = before
            .clone()
            .apply(FilterEvent::Replace(FilterKey(1), replacement.clone()));

        let keys: Vec<_> = state.filters().iter().map(|f| f.key).collect();
        assert_eq!(keys, [FilterKey(0), FilterKey(1), FilterKey(2)]);
        assert_eq!(state.filters()[0], before.filters()[0]);
        assert_eq!(state.filters()[2], before.filters()[2]);
        assert_eq!(state.get(FilterKey(1)), Some(&replacement));

        let unchanged = state
            .clone()
            .apply(FilterEvent::Replace(FilterKey(9), replacement));
        assert_eq!(unchanged, state);
    }
}
