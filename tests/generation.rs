use newsdesk::generate::keyword_focus;

#[test]
fn keyword_focus_rotates_between_candidates() {
    let first = keyword_focus("travel", 0);
    let second = keyword_focus("travel", 1);
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert_ne!(first, second);
    // Rotation, not replacement: consecutive focuses overlap.
    assert_eq!(first[1], second[0]);
}

#[test]
fn keyword_focus_wraps_around_the_pool() {
    let late = keyword_focus("travel", 4);
    assert_eq!(late.len(), 3);
    assert_eq!(late[0], "road trip");
    assert_eq!(late[1], "destinations");
}

#[test]
fn unknown_themes_get_no_keyword_hints() {
    assert!(keyword_focus("numismatics", 0).is_empty());
}
