use filter_core::{Combinator, Operator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterEditorConfig {
    /// Minimum time between two writes of the filter set, in milliseconds.
    pub cooldown_ms: u64,
    /// Operator of freshly added rows.
    pub default_operator: Operator,
    /// Node kind used when a row is promoted to a compound condition.
    pub default_combinator: Combinator,
}

impl Default for FilterEditorConfig {
    fn default() -> Self {
        FilterEditorConfig {
            cooldown_ms: 500,
            default_operator: Operator::Eq,
            default_combinator: Combinator::And,
        }
    }
}

impl FilterEditorConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl<C, S> super::FilterEditor<C, S> {
    pub fn config(&self) -> &FilterEditorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: FilterEditorConfig = serde_json::from_str(r#"{"cooldown_ms": 250}"#).unwrap();
        assert_eq!(config.cooldown(), Duration::from_millis(250));
        assert_eq!(config.default_operator, Operator::Eq);
        assert_eq!(config.default_combinator, Combinator::And);
    }
}
