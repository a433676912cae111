use crate::template::split_template;

#[test]
fn test_split_at_marker_line() {
    let (code, template) = split_template("puts 1\n__END__\n<p>hi</p>\n", "__END__");
    assert_eq!(code, "puts 1\n");
    assert_eq!(template, Some("<p>hi</p>\n"));
}

#[test]
fn test_marker_with_trailing_whitespace() {
    let (code, template) = split_template("a\n__END__  \r\nrest", "__END__");
    assert_eq!(code, "a\n");
    assert_eq!(template, Some("rest"));
}

#[test]
fn test_marker_on_last_line() {
    let (code, template) = split_template("a\n__END__", "__END__");
    assert_eq!(code, "a\n");
    assert_eq!(template, Some(""));
}

#[test]
fn test_marker_must_fill_the_line() {
    let text = "x = '__END__'\n  __END__\n";
    assert_eq!(split_template(text, "__END__"), (text, None));
}

#[test]
fn test_first_marker_wins() {
    let (code, template) = split_template("__END__\none\n__END__\ntwo", "__END__");
    assert_eq!(code, "");
    assert_eq!(template, Some("one\n__END__\ntwo"));
}

#[test]
fn test_empty_marker_never_matches() {
    assert_eq!(split_template("a\n\nb", ""), ("a\n\nb", None));
}
