//! Integration tests for label sanitizing

use rstest::rstest;

use rstree::domain::sanitize::encode;
use rstree::domain::LabelSanitizer;

#[rstest]
#[case::script("<script>x</script>", "")]
#[case::script_with_text("Hi<script>alert('x')</script> there", "Hi there")]
#[case::unclosed_script("ok<script>alert(1)", "ok")]
#[case::uppercase("<SCRIPT src=x>y</SCRIPT>z", "z")]
#[case::handler_attribute("<img src=x onerror=alert(1)>Pic", "Pic")]
#[case::comment("a<!-- <script>x</script> -->b", "ab")]
#[case::style("<style>body{}</style>Plain", "Plain")]
#[case::plain("Phones & Tablets", "Phones &amp; Tablets")]
#[case::quotes(r#"Say "hi" it's"#, "Say &quot;hi&quot; it&#039;s")]
#[case::comparison("1 < 2 > 0", "1 &lt; 2 &gt; 0")]
#[case::spaced_less_than("Price < Cost", "Price &lt; Cost")]
#[case::unterminated_tag_like("a <b", "a &lt;b")]
#[case::less_than_before_word("x<y and more", "x&lt;y and more")]
fn given_label_when_sanitizing_then_output_is_inert(#[case] raw: &str, #[case] expected: &str) {
    // Act
    let out = LabelSanitizer::new().sanitize(raw);

    // Assert
    assert_eq!(out, expected);
    assert!(!out.contains('<'));
    assert!(!out.contains('>'));
}

#[test]
fn given_encoded_text_when_encoding_again_then_ampersands_are_escaped() {
    assert_eq!(encode("&lt;"), "&amp;lt;");
}

#[test]
fn given_unicode_label_when_sanitizing_then_it_is_kept() {
    assert_eq!(LabelSanitizer::new().sanitize("Küche 🍳"), "Küche 🍳");
}
