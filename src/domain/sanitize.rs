//! Label sanitizing for widget output.
//!
//! Every label is purified (executable blocks removed, tags stripped) and then
//! HTML-entity encoded. Both steps always run; there is no "looks safe" shortcut.

use regex::Regex;

/// Elements dropped together with their content.
const BLOCK_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "textarea", "title",
];

/// Strict label sanitizer.
#[derive(Debug, Clone)]
pub struct LabelSanitizer {
    comment_regex: Regex,
    block_regex: Regex,
    unclosed_block_regex: Regex,
    tag_regex: Regex,
}

impl Default for LabelSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelSanitizer {
    pub fn new() -> Self {
        let blocks = BLOCK_ELEMENTS
            .iter()
            .map(|tag| format!(r"<{tag}\b[^>]*>.*?<\s*/\s*{tag}\s*>"))
            .collect::<Vec<_>>()
            .join("|");
        let openers = BLOCK_ELEMENTS.join("|");
        Self {
            comment_regex: Regex::new(r"(?s)<!--.*?(-->|$)").unwrap(),
            block_regex: Regex::new(&format!("(?is){blocks}")).unwrap(),
            unclosed_block_regex: Regex::new(&format!(r"(?is)<({openers})\b.*$")).unwrap(),
            tag_regex: Regex::new(r"</?[a-zA-Z!?][^>]*>").unwrap(),
        }
    }

    /// Purify then encode a raw label.
    pub fn sanitize(&self, raw: &str) -> String {
        encode(&self.purify(raw))
    }

    /// Remove markup, keeping only the text content.
    pub fn purify(&self, raw: &str) -> String {
        let text = self.comment_regex.replace_all(raw, "");
        let text = self.block_regex.replace_all(&text, "");
        let text = self.unclosed_block_regex.replace_all(&text, "");
        self.tag_regex.replace_all(&text, "").into_owned()
    }
}

/// HTML-entity encode `& < > " '`.
pub fn encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
