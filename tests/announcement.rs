use newsdesk::enhance::strip_code_fences;
use newsdesk::pipeline::{compose_announcement, keywords_from_title};

const LINK: &str = "https://example.com/p/42";

#[test]
fn short_draft_is_appended_with_link_unchanged() {
    let out = compose_announcement("Big news today! #tech", LINK, 280);
    assert_eq!(out, format!("Big news today! #tech\n\n{LINK}"));
}

#[test]
fn ceiling_holds_for_very_long_draft() {
    // A 10,000-character draft must still yield a compliant announcement.
    let draft = "a".repeat(10_000);
    let out = compose_announcement(&draft, LINK, 280);
    assert!(
        out.chars().count() <= 280,
        "announcement is {} chars",
        out.chars().count()
    );
    assert!(out.contains("..."), "truncation must leave an ellipsis marker");
    assert!(out.ends_with(LINK), "link must be kept intact");
}

#[test]
fn ceiling_holds_at_the_budget_boundary() {
    // Draft exactly fills the text budget; the actual link length pushes the
    // first composition over the ceiling and triggers the second trim.
    let draft = "b".repeat(256);
    let out = compose_announcement(&draft, LINK, 280);
    assert!(out.chars().count() <= 280);
    assert!(out.ends_with(LINK));
}

#[test]
fn ceiling_holds_for_links_longer_than_the_reserved_budget() {
    let long_link = "https://example.com/a-rather-long-permalink-slug";
    let draft = "c".repeat(300);
    let out = compose_announcement(&draft, long_link, 280);
    assert!(out.chars().count() <= 280);
    assert!(out.ends_with(long_link));
}

#[test]
fn multibyte_drafts_are_counted_in_characters() {
    let draft = "é".repeat(500);
    let out = compose_announcement(&draft, LINK, 280);
    assert!(out.chars().count() <= 280);
}

#[test]
fn keywords_drop_stop_words_and_short_words() {
    let kw = keywords_from_title("The Rise of AI in the Modern Newsroom Economy");
    assert_eq!(kw, "rise modern newsroom");
}

#[test]
fn keywords_empty_for_titles_without_significant_words() {
    assert_eq!(keywords_from_title("The and of in"), "");
}

#[test]
fn code_fences_are_stripped_from_model_output() {
    assert_eq!(
        strip_code_fences("```html\n<p>Hello</p>\n```"),
        "<p>Hello</p>"
    );
    assert_eq!(strip_code_fences("```\n<p>Hi</p>\n```"), "<p>Hi</p>");
    assert_eq!(strip_code_fences("<p>Plain</p>"), "<p>Plain</p>");
}
