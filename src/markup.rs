//! DokuWiki to markdown rewriting.
//!
//! The conversion is an ordered table of rewrite rules. Order matters: header rules run from the
//! widest delimiter to the narrowest (a level-1 `======` marker contains every narrower marker),
//! and the list rules assume bold spans have already been rewritten away from `**`.

use std::sync::LazyLock;

use regex::Regex;

pub const LEGACY_IMAGE_BASE_URL: &str = "https://api.unfoldingword.org/obs/jpg/1/en/";
pub const CDN_IMAGE_BASE_URL: &str = "https://cdn.door43.org/obs/jpg/";

enum Rewrite {
    Literal {
        from: &'static str,
        to: &'static str,
    },
    Pattern {
        regex: Regex,
        replacement: &'static str,
    },
    /// Applied until nothing matches; needed when consecutive matches share text. Every
    /// replacement must shrink the text.
    Fixpoint {
        regex: Regex,
        replacement: &'static str,
    },
}

pub struct Rule {
    name: &'static str,
    rewrite: Rewrite,
}

impl Rule {
    fn literal(name: &'static str, from: &'static str, to: &'static str) -> Self {
        Self {
            name,
            rewrite: Rewrite::Literal { from, to },
        }
    }

    fn pattern(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            rewrite: Rewrite::Pattern {
                regex: Regex::new(pattern).unwrap(),
                replacement,
            },
        }
    }

    fn fixpoint(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            rewrite: Rewrite::Fixpoint {
                regex: Regex::new(pattern).unwrap(),
                replacement,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, text: &str) -> String {
        match &self.rewrite {
            Rewrite::Literal { from, to } => text.replace(from, to),
            Rewrite::Pattern { regex, replacement } => {
                regex.replace_all(text, *replacement).into_owned()
            }
            Rewrite::Fixpoint { regex, replacement } => {
                let mut text = text.to_owned();
                while regex.is_match(&text) {
                    text = regex.replace_all(&text, *replacement).into_owned();
                }
                text
            }
        }
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::literal("carriage_returns", "\r", ""),
        Rule::pattern("blank_lines", r"\n{3,}", "\n\n"),
        Rule::pattern("h1", r"====== ?(.+?) ?======", "# ${1}"),
        Rule::pattern("h2", r"===== ?(.+?) ?=====", "## ${1}"),
        Rule::pattern("h3", r"==== ?(.+?) ?====", "### ${1}"),
        Rule::pattern("h4", r"=== ?(.+?) ?===", "#### ${1}"),
        Rule::pattern("h5", r"== ?(.+?) ?==", "##### ${1}"),
        // `://` in URLs must not open an italic span.
        Rule::pattern("italic", r"(?m)(^|[^:])//(.*?)//", "${1}_${2}_"),
        Rule::pattern("bold", r"\*\*(.*?)\*\*", "__${1}__"),
        Rule::pattern("image", r"\{\{(.*?)\}\}", "![OBS Image](${1})"),
        Rule::pattern(
            "link",
            r"\[\[(https?://[^|\]\s]+)\|(.*?)\]\]",
            "[${2}](${1})",
        ),
        Rule::pattern("list_indent", r"(?m)^ {1,3}\*", "*"),
        Rule::fixpoint("list_spacing", r"(?m)^(\*[^\n]*\n)\n(\*)", "${1}${2}"),
        Rule::literal("image_base_url", LEGACY_IMAGE_BASE_URL, CDN_IMAGE_BASE_URL),
    ]
});

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").unwrap());
static LINK_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[.*?\]\]").unwrap());

/// The rewrite rules in the order `translate` applies them.
pub fn rules() -> &'static [Rule] {
    &RULES
}

/// Convert one DokuWiki document to markdown.
pub fn translate(source_text: &str) -> String {
    rules().iter().fold(source_text.to_owned(), |text, rule| {
        let rewritten = rule.apply(&text);
        if rewritten != text {
            tracing::trace!(rule = rule.name(), "rewrote");
        }
        rewritten
    })
}

/// Drop leftover HTML tags and unconverted `[[...]]` link spans.
pub fn strip_markup_artifacts(text: &str) -> String {
    let text = HTML_TAG_RE.replace_all(text, "");
    LINK_SPAN_RE.replace_all(&text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str) -> &'static Rule {
        rules()
            .iter()
            .find(|rule| rule.name() == name)
            .unwrap_or_else(|| panic!("no rule named {name}"))
    }

    #[test]
    fn headers_convert_on_minimal_input() {
        assert_eq!(translate("======Text======"), "# Text");
        assert_eq!(translate("=====Text====="), "## Text");
        assert_eq!(translate("====Text===="), "### Text");
        assert_eq!(translate("===Text==="), "#### Text");
        assert_eq!(translate("==Text=="), "##### Text");
    }

    #[test]
    fn headers_convert_on_realistic_input() {
        assert_eq!(
            translate("====== 1. The Creation ======\n"),
            "# 1. The Creation\n"
        );
        assert_eq!(
            translate("===== Open Bible Stories =====\n"),
            "## Open Bible Stories\n"
        );
        assert_eq!(translate("==== A Word About Pictures ===="), "### A Word About Pictures");
        assert_eq!(translate("=== Frame notes ==="), "#### Frame notes");
        assert_eq!(translate("== Small print =="), "##### Small print");
    }

    #[test]
    fn narrow_header_rule_alone_would_mangle_a_level_one_header() {
        // Table order keeps this from ever happening in `translate`.
        let mangled = rule("h5").apply("====== Title ======");
        assert!(mangled.starts_with("##### "));
        assert_ne!(mangled, "# Title");
        assert_eq!(translate("====== Title ======"), "# Title");
    }

    #[test]
    fn header_rules_run_widest_first() {
        let names: Vec<&str> = rules().iter().map(Rule::name).collect();
        let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
        assert!(position("h1") < position("h2"));
        assert!(position("h2") < position("h3"));
        assert!(position("h3") < position("h4"));
        assert!(position("h4") < position("h5"));
        assert!(position("h5") < position("italic"));
    }

    #[test]
    fn carriage_returns_and_blank_runs_are_normalized() {
        assert_eq!(translate("a\r\n\r\n\r\n\r\nb"), "a\n\nb");
        assert_eq!(translate("a\n\n\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(translate("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(translate(""), "");
    }

    #[test]
    fn plain_text_passes_through() {
        let text = "God created everything.\n\nIt was good.\n";
        assert_eq!(translate(text), text);
    }

    #[test]
    fn italic_skips_url_schemes() {
        assert_eq!(translate("a //word// b"), "a _word_ b");
        assert_eq!(translate("//A Bible story from: Genesis 1-2//"), "_A Bible story from: Genesis 1-2_");
        assert_eq!(
            translate("see https://example.org/page"),
            "see https://example.org/page"
        );
    }

    #[test]
    fn bold_and_image_spans_convert() {
        assert_eq!(translate("**Open Bible Stories**"), "__Open Bible Stories__");
        assert_eq!(
            translate("{{https://cdn.door43.org/obs/jpg/360px/obs-en-01-01.jpg}}"),
            "![OBS Image](https://cdn.door43.org/obs/jpg/360px/obs-en-01-01.jpg)"
        );
    }

    #[test]
    fn links_convert_to_markdown() {
        assert_eq!(
            translate("[[https://example.org/x|Example]]"),
            "[Example](https://example.org/x)"
        );
        assert_eq!(
            translate("visit [[http://openbiblestories.com|openbiblestories.com]] today"),
            "visit [openbiblestories.com](http://openbiblestories.com) today"
        );
    }

    #[test]
    fn list_indentation_and_spacing_are_tightened() {
        assert_eq!(translate("  * one\n   * two"), "* one\n* two");
        assert_eq!(translate("* one\n\n* two\n\n* three\n"), "* one\n* two\n* three\n");
        assert_eq!(translate("* one\n\nparagraph"), "* one\n\nparagraph");
    }

    #[test]
    fn legacy_image_base_url_is_replaced() {
        assert_eq!(
            translate("https://api.unfoldingword.org/obs/jpg/1/en/360px/obs-en-02-03.jpg"),
            "https://cdn.door43.org/obs/jpg/360px/obs-en-02-03.jpg"
        );
    }

    #[test]
    fn malformed_delimiters_stay_literal() {
        assert_eq!(translate("**unclosed bold"), "**unclosed bold");
        assert_eq!(translate("{{unclosed image"), "{{unclosed image");
        assert_eq!(translate("[[not a url|label]]"), "[[not a url|label]]");
    }

    #[test]
    fn translate_is_idempotent_on_converted_markdown() {
        let source = "====== 2. Sin Enters the World ======\r\n\r\n\r\n\
{{https://api.unfoldingword.org/obs/jpg/1/en/360px/obs-en-02-01.jpg}}\n\n\
Adam and his wife were **very** happy. See [[https://example.org/x|Example]].\n\n\
  * first\n\n  * second\n\n\
//A Bible story from: Genesis 3//\n";
        let once = translate(source);
        assert_eq!(translate(&once), once);
    }

    #[test]
    fn strip_markup_artifacts_removes_tags_and_links() {
        assert_eq!(
            strip_markup_artifacts("Checking Level: <b>3</b> [[en:obs:notes|notes]]"),
            "Checking Level: 3 "
        );
        assert_eq!(strip_markup_artifacts("plain"), "plain");
    }
}
