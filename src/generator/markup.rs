//! HTML rendering helpers for archetypes.
//!
//! Archetypes assemble pages from these primitives so the noise they inject
//! (filler sections, decoy comments, sloppy markup) stays deterministic for
//! a given RNG state.

use rand::RngExt;
use rand_chacha::ChaCha8Rng;

/// Escapes text content for safe embedding in an element body.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes text for embedding inside a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

/// Incremental page builder producing stable, byte-identical output for
/// identical inputs.
pub struct HtmlPage {
    title: String,
    blocks: Vec<String>,
}

impl HtmlPage {
    /// Starts a page with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// Appends a raw block to the body.
    pub fn push(&mut self, block: impl Into<String>) {
        self.blocks.push(block.into());
    }

    /// Renders the full document.
    pub fn finish(self) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        out.push_str(&format!("<title>{}</title>\n", escape_text(&self.title)));
        out.push_str("<meta charset=\"utf-8\">\n</head>\n<body>\n");
        for block in &self.blocks {
            out.push_str(block);
            out.push('\n');
        }
        out.push_str("</body>\n</html>\n");
        out
    }
}

/// Word pool for filler copy.
const FILLER_WORDS: [&str; 24] = [
    "premium", "durable", "compact", "versatile", "reliable", "modern", "classic", "robust",
    "sleek", "portable", "efficient", "quality", "trusted", "popular", "seasonal", "featured",
    "limited", "exclusive", "standard", "advanced", "basic", "improved", "original", "certified",
];

/// Section headings for filler blocks.
const FILLER_HEADINGS: [&str; 8] = [
    "About us",
    "Shipping information",
    "Customer reviews",
    "Related products",
    "Why shop with us",
    "Returns policy",
    "Our guarantee",
    "Frequently asked questions",
];

/// A short filler sentence.
pub fn filler_sentence(rng: &mut ChaCha8Rng) -> String {
    let len = rng.random_range(5..10);
    let mut words = Vec::with_capacity(len);
    for _ in 0..len {
        words.push(FILLER_WORDS[rng.random_range(0..FILLER_WORDS.len())]);
    }
    let mut sentence = words.join(" ");
    if let Some(first) = sentence.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    sentence.push('.');
    sentence
}

/// A filler section with a heading and one or two paragraphs. Pure noise:
/// never contains task content.
pub fn filler_section(rng: &mut ChaCha8Rng) -> String {
    let heading = FILLER_HEADINGS[rng.random_range(0..FILLER_HEADINGS.len())];
    let paragraphs = rng.random_range(1..=2);
    let mut out = format!("<section>\n<h2>{}</h2>\n", heading);
    for _ in 0..paragraphs {
        out.push_str(&format!("<p>{}</p>\n", filler_sentence(rng)));
    }
    out.push_str("</section>");
    out
}

/// An HTML comment that looks like leftover tooling output.
pub fn decoy_comment(rng: &mut ChaCha8Rng) -> String {
    let fragments = [
        "rendered by cms v2.14",
        "cache: miss",
        "template: listing/default",
        "ab-test: variant-b",
        "edge: fra-3",
    ];
    let fragment = fragments[rng.random_range(0..fragments.len())];
    format!("<!-- {} -->", fragment)
}

/// Occasionally sloppy markup: a stray unclosed tag real pages are full
/// of. Harmless to parsers, but keeps artifacts from looking sterile.
pub fn malformation(rng: &mut ChaCha8Rng) -> Option<String> {
    if rng.random::<f64>() < 0.3 {
        let options = ["<br>", "<hr>", "<p>", "<center>watch this space</center>"];
        Some(options[rng.random_range(0..options.len())].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::derive_rng;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"say "hi""#), "say &quot;hi&quot;");
    }

    #[test]
    fn test_page_structure() {
        let mut page = HtmlPage::new("Test");
        page.push("<p>hello</p>");
        let html = page.finish();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Test</title>"));
        assert!(html.contains("<p>hello</p>"));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn test_filler_deterministic() {
        let mut a = derive_rng("markup-test", 1);
        let mut b = derive_rng("markup-test", 1);
        assert_eq!(filler_section(&mut a), filler_section(&mut b));
        assert_eq!(decoy_comment(&mut a), decoy_comment(&mut b));
    }

    #[test]
    fn test_filler_never_empty() {
        let mut rng = derive_rng("markup-test", 2);
        for _ in 0..20 {
            let s = filler_sentence(&mut rng);
            assert!(s.ends_with('.'));
            assert!(s.len() > 10);
        }
    }
}
