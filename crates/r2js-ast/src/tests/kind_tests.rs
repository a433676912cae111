use crate::NodeKind;

#[test]
fn test_every_kind_round_trips_by_name() {
    for &kind in NodeKind::ALL {
        assert_eq!(NodeKind::from_name(kind.as_str()), Some(kind), "{kind}");
    }
}

#[test]
fn test_parser_spellings() {
    assert_eq!(NodeKind::from_name("op_asgn"), Some(NodeKind::OpAsgn));
    assert_eq!(NodeKind::from_name("while_post"), Some(NodeKind::WhilePost));
    assert_eq!(NodeKind::from_name("defined?"), Some(NodeKind::Defined));
    assert_eq!(NodeKind::from_name("self"), Some(NodeKind::SelfRef));
    assert_eq!(NodeKind::from_name("block_pass"), Some(NodeKind::BlockPass));
    assert_eq!(NodeKind::from_name("nonsense"), None);
}

#[test]
fn test_kind_categories() {
    assert!(NodeKind::Lvasgn.is_assignment());
    assert!(!NodeKind::OpAsgn.is_assignment());
    assert!(NodeKind::UntilPost.is_loop());
    assert!(NodeKind::Pair.is_structural());
    assert!(NodeKind::Autoreturn.is_synthetic());
    assert!(!NodeKind::Send.is_synthetic());
}

#[test]
fn test_kind_serde_uses_names() {
    let json = serde_json::to_string(&NodeKind::AndAsgn).expect("serialize");
    assert_eq!(json, "\"and_asgn\"");
    let kind: NodeKind = serde_json::from_str("\"csend\"").expect("deserialize");
    assert_eq!(kind, NodeKind::Csend);
    assert!(serde_json::from_str::<NodeKind>("\"bogus\"").is_err());
}
