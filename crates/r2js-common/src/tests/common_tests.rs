use crate::common::{Comparison, EsLevel, LogicalOperator};

#[test]
fn test_es_level_normalizes_edition_numbers() {
    assert_eq!(EsLevel::from_number(5), EsLevel::ES5);
    assert_eq!(EsLevel::from_number(6), EsLevel::ES2015);
    assert_eq!(EsLevel::from_number(11), EsLevel::ES2020);
    assert_eq!(EsLevel::from_number(13), EsLevel::ES2022);
}

#[test]
fn test_es_level_normalizes_years() {
    assert_eq!(EsLevel::from_number(2009), EsLevel::ES5);
    assert_eq!(EsLevel::from_number(2012), EsLevel::ES5);
    assert_eq!(EsLevel::from_number(2017), EsLevel::ES2017);
    // Future years clamp to the newest known tier.
    assert_eq!(EsLevel::from_number(2030), EsLevel::LATEST);
}

#[test]
fn test_es_level_supports_is_monotonic() {
    assert!(EsLevel::ES2020.supports(EsLevel::ES2015));
    assert!(EsLevel::ES2020.supports(EsLevel::ES2020));
    assert!(!EsLevel::ES2019.supports(EsLevel::ES2020));
    assert!(EsLevel::ES5.supports(EsLevel::ES5));
}

#[test]
fn test_es_level_display() {
    assert_eq!(EsLevel::ES5.to_string(), "ES5");
    assert_eq!(EsLevel::ES2015.to_string(), "ES2015");
    assert_eq!(EsLevel::default(), EsLevel::ES5);
}

#[test]
fn test_es_level_deserializes_from_json_number() {
    let level: EsLevel = serde_json::from_str("2019").expect("year");
    assert_eq!(level, EsLevel::ES2019);
    let level: EsLevel = serde_json::from_str("6").expect("edition");
    assert_eq!(level, EsLevel::ES2015);
    assert_eq!(serde_json::to_string(&EsLevel::ES2021).expect("serialize"), "2021");
}

#[test]
fn test_operator_choices_deserialize_lowercase() {
    let comparison: Comparison = serde_json::from_str("\"identity\"").expect("comparison");
    assert_eq!(comparison, Comparison::Identity);
    let or: LogicalOperator = serde_json::from_str("\"nullish\"").expect("or");
    assert_eq!(or.token(), "??");
    assert_eq!(LogicalOperator::default().token(), "||");
    assert_eq!(Comparison::default(), Comparison::Loose);
}
