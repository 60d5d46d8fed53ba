//! Rich-text pipeline: sanitizer, markup-to-HTML renderer, and plain-text
//! extractor.
//!
//! Notes are written in a small custom markup (heading markers `#1`..`#3`,
//! `**bold**`, `*italic*`, `__underline__`, `~~strike~~`, bracket tags for
//! color/size/background, `- ` list items, `> ` quotes). The renderer is an
//! ordered sequence of regex substitutions over the whole document; order
//! matters and is covered by tests.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());
static SCRIPT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?script\b[^>]*>").unwrap());
static IFRAME_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe>").unwrap());
static IFRAME_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?iframe\b[^>]*>").unwrap());
static EVENT_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bon\w+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]*)"#).unwrap());

static HEADING_1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#1 (.*)$").unwrap());
static HEADING_2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#2 (.*)$").unwrap());
static HEADING_3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#3 (.*)$").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__(.+?)__").unwrap());
static STRIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~(.+?)~~").unwrap());
static COLOR_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[color=([#a-zA-Z0-9]+)\](.*?)\[/color\]").unwrap());
static SIZE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[size=(\d+)\](.*?)\[/size\]").unwrap());
static BG_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[bg=([#a-zA-Z0-9]+)\](.*?)\[/bg\]").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^- (.*)$").unwrap());
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^> (.*)$").unwrap());

static ANY_BRACKET_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(?:color|bg)=[#a-zA-Z0-9]+\]|\[size=\d+\]|\[/(?:color|size|bg)\]").unwrap()
});
static HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#[123] ").unwrap());
static LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^- ").unwrap());
static QUOTE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^> ").unwrap());

/// Strip `<script>`/`<iframe>` blocks (including orphan open/close tags) and
/// inline `on*=` event-handler attributes, case-insensitively.
///
/// Empty input yields an empty string; sanitization never fails.
pub fn sanitize(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let out = SCRIPT_BLOCK.replace_all(input, "");
    let out = SCRIPT_TAG.replace_all(&out, "");
    let out = IFRAME_BLOCK.replace_all(&out, "");
    let out = IFRAME_TAG.replace_all(&out, "");
    let out = EVENT_ATTR.replace_all(&out, "");
    out.into_owned()
}

/// Render the custom markup to HTML.
///
/// Substitution order is load-bearing: bold runs before italic so the `*`
/// pattern cannot capture across `**` pairs, and list wrapping happens after
/// line-level substitutions but before newline conversion.
///
/// Text with no markers passes through unchanged except `\n` → `<br>`.
pub fn to_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let out = HEADING_1.replace_all(text, "<h1>$1</h1>");
    let out = HEADING_2.replace_all(&out, "<h2>$1</h2>");
    let out = HEADING_3.replace_all(&out, "<h3>$1</h3>");
    let out = BOLD.replace_all(&out, "<b>$1</b>");
    let out = ITALIC.replace_all(&out, "<i>$1</i>");
    let out = UNDERLINE.replace_all(&out, "<u>$1</u>");
    let out = STRIKE.replace_all(&out, "<s>$1</s>");
    let out = COLOR_TAG.replace_all(&out, r#"<span style="color:$1">$2</span>"#);
    let out = SIZE_TAG.replace_all(&out, r#"<span style="font-size:${1}px">$2</span>"#);
    let out = BG_TAG.replace_all(&out, r#"<span style="background-color:$1">$2</span>"#);
    let out = LIST_ITEM.replace_all(&out, "<li>$1</li>");
    let out = BLOCKQUOTE.replace_all(&out, "<blockquote>$1</blockquote>");

    let out = wrap_list_items(&out);
    out.replace('\n', "<br>")
}

/// Wrap the span from the first `<li>` to the last `</li>` in a single
/// `<ul>`. Separate lists in one document therefore collapse into one list.
// TODO: wrap each contiguous <li> run in its own <ul> instead of one
// greedy wrap across the whole document.
fn wrap_list_items(html: &str) -> String {
    match (html.find("<li>"), html.rfind("</li>")) {
        (Some(first), Some(last)) => {
            let end = last + "</li>".len();
            format!(
                "{}<ul>{}</ul>{}",
                &html[..first],
                &html[first..end],
                &html[end..]
            )
        }
        _ => html.to_string(),
    }
}

/// Strip every markup marker without emitting HTML. Newlines are preserved.
pub fn to_plain_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let out = HEADING_MARKER.replace_all(text, "");
    let out = BOLD.replace_all(&out, "$1");
    let out = ITALIC.replace_all(&out, "$1");
    let out = UNDERLINE.replace_all(&out, "$1");
    let out = STRIKE.replace_all(&out, "$1");
    let out = ANY_BRACKET_TAG.replace_all(&out, "");
    let out = LIST_MARKER.replace_all(&out, "");
    let out = QUOTE_MARKER.replace_all(&out, "");
    out.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_script_any_casing() {
        let input = "before <SCRIPT type=\"text/javascript\">alert(1)</ScRiPt> after";
        let out = sanitize(input);
        assert!(!out.to_lowercase().contains("script"));
        assert!(!out.contains("alert"));
        assert!(out.contains("before"));
        assert!(out.contains("after"));
    }

    #[test]
    fn test_sanitize_strips_orphan_script_tag() {
        let out = sanitize("x <script> y");
        assert!(!out.contains("<script>"));
        assert!(out.contains("y"));
    }

    #[test]
    fn test_sanitize_strips_iframe() {
        let out = sanitize("a<IFRAME src=\"http://evil\">b</IFRAME>c");
        assert!(!out.to_lowercase().contains("iframe"));
        assert_eq!(out, "ac");
    }

    #[test]
    fn test_sanitize_strips_event_handlers() {
        let out = sanitize("<img src=x ONCLICK=\"steal()\" onerror='x()' onload=run>");
        assert!(!out.to_lowercase().contains("onclick"));
        assert!(!out.to_lowercase().contains("onerror"));
        assert!(!out.to_lowercase().contains("onload"));
        assert!(out.contains("<img src=x"));
    }

    #[test]
    fn test_sanitize_empty_input() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_to_html_plain_text_passthrough() {
        // No markers: output equals input with newlines converted.
        assert_eq!(to_html("hello\nworld"), "hello<br>world");
        assert_eq!(to_html("no markup at all"), "no markup at all");
    }

    #[test]
    fn test_to_html_headings() {
        assert_eq!(to_html("#1 Title"), "<h1>Title</h1>");
        assert_eq!(to_html("#2 Sub"), "<h2>Sub</h2>");
        assert_eq!(to_html("#3 Minor"), "<h3>Minor</h3>");
    }

    #[test]
    fn test_to_html_bold_before_italic() {
        // The ** pair must not be half-eaten by the single-* pattern.
        assert_eq!(
            to_html("**bold** and *ital*"),
            "<b>bold</b> and <i>ital</i>"
        );
    }

    #[test]
    fn test_to_html_underline_and_strike() {
        assert_eq!(to_html("__u__ ~~s~~"), "<u>u</u> <s>s</s>");
    }

    #[test]
    fn test_to_html_bracket_tags() {
        assert_eq!(
            to_html("[color=red]warm[/color]"),
            r#"<span style="color:red">warm</span>"#
        );
        assert_eq!(
            to_html("[size=14]big[/size]"),
            r#"<span style="font-size:14px">big</span>"#
        );
        assert_eq!(
            to_html("[bg=#ffff00]marked[/bg]"),
            r#"<span style="background-color:#ffff00">marked</span>"#
        );
    }

    #[test]
    fn test_to_html_list_wrapping() {
        let out = to_html("- one\n- two");
        assert_eq!(out, "<ul><li>one</li><br><li>two</li></ul>");
    }

    #[test]
    fn test_to_html_separated_lists_collapse() {
        // Known behavior: everything between the first and last item lands
        // in one list, including the intervening paragraph.
        let out = to_html("- a\ntext\n- b");
        assert_eq!(out.matches("<ul>").count(), 1);
        assert_eq!(out.matches("</ul>").count(), 1);
        assert!(out.contains("<li>a</li>"));
        assert!(out.contains("<li>b</li>"));
    }

    #[test]
    fn test_to_html_blockquote() {
        assert_eq!(to_html("> quoted"), "<blockquote>quoted</blockquote>");
    }

    #[test]
    fn test_to_html_empty_input() {
        assert_eq!(to_html(""), "");
    }

    #[test]
    fn test_to_plain_text_strips_all_markers() {
        let input = "#1 Title\n**b** *i* __u__ ~~s~~\n[color=red]x[/color]\n- item\n> quote";
        let out = to_plain_text(input);
        assert_eq!(out, "Title\nb i u s\nx\nitem\nquote");
    }

    #[test]
    fn test_to_plain_text_preserves_plain_input() {
        assert_eq!(to_plain_text("just text\nlines"), "just text\nlines");
    }
}
