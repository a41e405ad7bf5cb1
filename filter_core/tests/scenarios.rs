use filter_core::condition::{and, infix, not, or};
use filter_core::edit::{promote, strip};
use filter_core::error::MalformedPatternKind;
use filter_core::pattern::{pack, unpack};
use filter_core::{Combinator, ColumnRef, Operator, PartialCondition, PartialSimpleFilter};

fn valid(col: u32, value: &str) -> PartialCondition {
    PartialCondition::Infix(
        PartialSimpleFilter::empty(Operator::GtEq)
            .with_column(ColumnRef::new(col))
            .with_user_value(value),
    )
}

#[test]
fn pack_escapes_every_reserved_character() {
    let packed = pack("100%_done\\");
    assert_eq!(packed, r"%100\%\_done\\%");
    assert_eq!(unpack(&packed).unwrap(), "100%_done\\");
}

#[test]
fn unpack_rejects_foreign_patterns() {
    assert_eq!(
        unpack("abc").unwrap_err().kind,
        MalformedPatternKind::MissingDelimiter
    );
    assert_eq!(
        unpack(r"%abc\%").unwrap_err().kind,
        MalformedPatternKind::DanglingEscape
    );
    let err = unpack("%a%b%").unwrap_err();
    assert_eq!(err.kind, MalformedPatternKind::UnescapedReserved('%'));
    assert_eq!(err.position, 2);
    assert!(err.to_string().contains("position 2"));
}

#[test]
fn strip_and_with_empty_leaf_yields_leaf() {
    let empty = PartialCondition::empty_leaf(Operator::Eq);
    let expected = infix(ColumnRef::new(5), Operator::GtEq, "18");
    assert_eq!(strip(&and(valid(5, "18"), empty.clone())), Some(expected.clone()));
    assert_eq!(strip(&and(empty.clone(), valid(5, "18"))), Some(expected.clone()));
    assert_eq!(strip(&or(empty, valid(5, "18"))), Some(expected));
}

#[test]
fn strip_not_of_empty_is_none() {
    assert_eq!(strip(&not(PartialCondition::empty_leaf(Operator::Eq))), None);
}

#[test]
fn promote_then_strip_round_trips() {
    let promoted = promote(valid(2, "x"), Combinator::And, Operator::Eq);
    assert!(matches!(promoted, PartialCondition::And { .. }));
    assert_eq!(strip(&promoted), Some(infix(ColumnRef::new(2), Operator::GtEq, "x")));
}
