//! Human readable rendering of a filter set, e.g. `Name contains 'Institut' AND Age >= 18`.

use crate::service::{ColumnCatalog, ColumnInfo};
use filter_core::pattern::unpack;
use filter_core::{Condition, MalformedPatternError, Operator, SimpleFilter};
use itertools::Itertools;
use std::convert::Infallible;
use std::error::Error;
use thiserror::Error;

/// Turns a stored literal into its display form (dates, currency, ...). Opaque to the editor.
pub trait ValueCodec {
    type Error: Error + Send + Sync + 'static;

    fn format(&self, column: Option<&ColumnInfo>, raw: &str) -> Result<String, Self::Error>;
}

/// Shows stored values as they are.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlainCodec;

impl ValueCodec for PlainCodec {
    type Error = Infallible;

    fn format(&self, _column: Option<&ColumnInfo>, raw: &str) -> Result<String, Self::Error> {
        Ok(raw.to_string())
    }
}

#[derive(Error, Debug)]
pub enum DescribeError {
    #[error(transparent)]
    Pattern(#[from] MalformedPatternError),
    #[error("cannot format value of column {column}")]
    Value {
        column: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

pub fn describe(
    conditions: &[Condition],
    catalog: &impl ColumnCatalog,
    codec: &impl ValueCodec,
) -> Result<String, DescribeError> {
    let nested = conditions.len() > 1;
    let parts = conditions
        .iter()
        .map(|c| describe_condition(c, nested, catalog, codec))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.iter().join(" AND "))
}

fn describe_condition(
    condition: &Condition,
    nested: bool,
    catalog: &impl ColumnCatalog,
    codec: &impl ValueCodec,
) -> Result<String, DescribeError> {
    let binary = |left: &Condition, word: &str, right: &Condition| {
        let text = format!(
            "{} {word} {}",
            describe_condition(left, true, catalog, codec)?,
            describe_condition(right, true, catalog, codec)?
        );
        Ok::<_, DescribeError>(if nested { format!("({text})") } else { text })
    };
    match condition {
        Condition::Infix(leaf) => describe_leaf(leaf, catalog, codec),
        Condition::Not { condition } => Ok(format!(
            "NOT {}",
            describe_condition(condition, true, catalog, codec)?
        )),
        Condition::And { left, right } => binary(left.as_ref(), "AND", right.as_ref()),
        Condition::Or { left, right } => binary(left.as_ref(), "OR", right.as_ref()),
    }
}

fn describe_leaf(
    leaf: &SimpleFilter,
    catalog: &impl ColumnCatalog,
    codec: &impl ValueCodec,
) -> Result<String, DescribeError> {
    let info = catalog.column_info(leaf.left);
    let column = match (info, leaf.left.join_id) {
        (Some(info), _) => info.display_name.clone(),
        (None, Some(join_id)) => format!("#{}.{join_id}", leaf.left.parent_column_id),
        (None, None) => format!("#{}", leaf.left.parent_column_id),
    };
    let (operator, raw) = match leaf.operator {
        Operator::Like => ("contains".to_string(), unpack(&leaf.right.value)?),
        op => (op.to_string(), leaf.right.value.clone()),
    };
    let value = codec
        .format(info, &raw)
        .map_err(|e| DescribeError::Value {
            column: column.clone(),
            source: Box::new(e),
        })?;
    if is_plain_number(&value) {
        Ok(format!("{column} {operator} {value}"))
    } else {
        Ok(format!("{column} {operator} '{value}'"))
    }
}

/// Optional sign, digits, optional fraction. `inf`, `NaN` and exponents are quoted.
fn is_plain_number(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.is_none_or(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MemoryCatalog;
    use filter_core::condition::{and, infix, not, or};
    use filter_core::pattern::pack;
    use filter_core::ColumnRef;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new()
            .with_column(ColumnRef::new(1), "Name")
            .with_column(ColumnRef::new(2), "Age")
    }

    #[test]
    fn renders_top_level_conjunction() {
        let filters = [
            infix(ColumnRef::new(1), Operator::Like, pack("Institut")),
            infix(ColumnRef::new(2), Operator::GtEq, "18"),
        ];
        assert_eq!(
            describe(&filters, &catalog(), &PlainCodec).unwrap(),
            "Name contains 'Institut' AND Age >= 18"
        );
    }

    #[test]
    fn parenthesizes_nested_nodes() {
        let filters = [
            or(
                infix(ColumnRef::new(2), Operator::Lt, "3"),
                not(infix(ColumnRef::new(1), Operator::Eq, "x")),
            ),
            infix(ColumnRef::joined(7, 3), Operator::NotEq, "y"),
        ];
        assert_eq!(
            describe(&filters, &catalog(), &PlainCodec).unwrap(),
            "(Age < 3 OR NOT Name = 'x') AND #7.3 != 'y'"
        );
        let single = [and(
            infix(ColumnRef::new(2), Operator::Gt, "1"),
            infix(ColumnRef::new(2), Operator::Lt, "9"),
        )];
        assert_eq!(
            describe(&single, &catalog(), &PlainCodec).unwrap(),
            "Age > 1 AND Age < 9"
        );
    }

    #[test]
    fn only_plain_decimals_are_unquoted() {
        let filters = [
            infix(ColumnRef::new(2), Operator::GtEq, "-1.5"),
            infix(ColumnRef::new(1), Operator::Eq, "inf"),
            infix(ColumnRef::new(1), Operator::Eq, "NaN"),
            infix(ColumnRef::new(1), Operator::Eq, "1e5"),
            infix(ColumnRef::new(1), Operator::Eq, "3."),
        ];
        assert_eq!(
            describe(&filters, &catalog(), &PlainCodec).unwrap(),
            "Age >= -1.5 AND Name = 'inf' AND Name = 'NaN' AND Name = '1e5' AND Name = '3.'"
        );
    }

    #[test]
    fn surfaces_malformed_patterns() {
        let filters = [infix(ColumnRef::new(1), Operator::Like, "%50%%")];
        assert!(matches!(
            describe(&filters, &catalog(), &PlainCodec),
            Err(DescribeError::Pattern(_))
        ));
    }
}
