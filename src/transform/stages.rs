// Individual rendering stages of the content transformer
//
// Each stage takes the output of the stage before it. The precondition each
// one relies on is noted on the function.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Inline style applied to every rendered image
pub const IMAGE_STYLE: &str = "max-width: 100%; height: auto; margin: 15px 0; border-radius: 4px; box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);";

/// Alt text for images that carry none of their own
pub const GENERATED_IMAGE_ALT: &str = "Generated Image";

/// Tags that mark a segment as already structured for paragraph wrapping
const BLOCK_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "img",
    "pre",
    "blockquote",
    "ul",
    "ol",
    "li",
    "div",
    "table",
    "hr",
];

// Compiled regex patterns
static STANDALONE_IMAGE_PATTERN: OnceLock<Regex> = OnceLock::new();
static INLINE_IMAGE_PATTERN: OnceLock<Regex> = OnceLock::new();
static H3_PATTERN: OnceLock<Regex> = OnceLock::new();
static H2_PATTERN: OnceLock<Regex> = OnceLock::new();
static H1_PATTERN: OnceLock<Regex> = OnceLock::new();
static BOLD_PATTERN: OnceLock<Regex> = OnceLock::new();
static ITALIC_PATTERN: OnceLock<Regex> = OnceLock::new();
static FENCE_PATTERN: OnceLock<Regex> = OnceLock::new();
static INLINE_CODE_PATTERN: OnceLock<Regex> = OnceLock::new();
static BLOCKQUOTE_PATTERN: OnceLock<Regex> = OnceLock::new();
static BLANK_LINE_PATTERN: OnceLock<Regex> = OnceLock::new();
static NEWLINE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn get_standalone_image_pattern() -> &'static Regex {
    STANDALONE_IMAGE_PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^data:image/[A-Za-z0-9.+-]+;base64,[A-Za-z0-9+/=\t\r ]+$").unwrap()
    })
}

fn get_inline_image_pattern() -> &'static Regex {
    INLINE_IMAGE_PATTERN.get_or_init(|| {
        Regex::new(r"!\[([^\]]*)\]\((data:image/[^;)]+;base64,[^)]+)\)").unwrap()
    })
}

fn get_h3_pattern() -> &'static Regex {
    H3_PATTERN.get_or_init(|| Regex::new(r"(?m)^### (.*?)\r?$").unwrap())
}

fn get_h2_pattern() -> &'static Regex {
    H2_PATTERN.get_or_init(|| Regex::new(r"(?m)^## (.*?)\r?$").unwrap())
}

fn get_h1_pattern() -> &'static Regex {
    H1_PATTERN.get_or_init(|| Regex::new(r"(?m)^# (.*?)\r?$").unwrap())
}

fn get_bold_pattern() -> &'static Regex {
    BOLD_PATTERN.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").unwrap())
}

fn get_italic_pattern() -> &'static Regex {
    ITALIC_PATTERN.get_or_init(|| Regex::new(r"\*(.+?)\*").unwrap())
}

fn get_fence_pattern() -> &'static Regex {
    FENCE_PATTERN.get_or_init(|| Regex::new(r"(?s)```(.*?)```").unwrap())
}

fn get_inline_code_pattern() -> &'static Regex {
    INLINE_CODE_PATTERN.get_or_init(|| Regex::new(r"`([^`\n]+)`").unwrap())
}

fn get_blockquote_pattern() -> &'static Regex {
    BLOCKQUOTE_PATTERN.get_or_init(|| Regex::new(r"(?m)^> (.*?)\r?$").unwrap())
}

fn get_blank_line_pattern() -> &'static Regex {
    BLANK_LINE_PATTERN.get_or_init(|| Regex::new(r"\n\s*\n").unwrap())
}

fn get_newline_pattern() -> &'static Regex {
    NEWLINE_PATTERN.get_or_init(|| Regex::new(r"\r?\n").unwrap())
}

fn image_tag(src: &str, alt: &str, with_title: bool) -> String {
    if with_title {
        format!(
            r#"<img src="{}" alt="{}" title="{}" style="{}" />"#,
            src, alt, alt, IMAGE_STYLE
        )
    } else {
        format!(r#"<img src="{}" alt="{}" style="{}" />"#, src, alt, IMAGE_STYLE)
    }
}

/// Stage 1: a line that starts with a base64 image data URI and holds only
/// encoded data up to the line end becomes an image. Whitespace inside the
/// encoded run (spaces, tabs, a trailing `\r`) is removed from the source.
///
/// Expects raw service text.
pub fn embed_standalone_images(input: &str) -> String {
    get_standalone_image_pattern()
        .replace_all(input, |caps: &Captures| {
            let clean: String = caps[0].chars().filter(|c| !c.is_whitespace()).collect();
            log::debug!("Found standalone base64 image, converting to img tag");
            image_tag(&clean, GENERATED_IMAGE_ALT, false)
        })
        .into_owned()
}

/// Stage 2: `![alt](data:image/...;base64,...)` becomes an image whose alt
/// text doubles as its tooltip.
///
/// Expects standalone data URI lines to be replaced already, so only
/// references wrapped in markdown image syntax remain.
pub fn embed_inline_images(input: &str) -> String {
    get_inline_image_pattern()
        .replace_all(input, |caps: &Captures| {
            log::debug!("Found markdown base64 image, converting to img tag");
            image_tag(&caps[2], &caps[1], true)
        })
        .into_owned()
}

/// Stage 3: `### `, `## ` and `# ` line prefixes become h3, h2 and h1.
///
/// Longer prefixes are replaced first so `### x` never turns into an h1
/// holding `## x`.
pub fn render_headings(input: &str) -> String {
    let out = get_h3_pattern().replace_all(input, "<h3>$1</h3>");
    let out = get_h2_pattern().replace_all(&out, "<h2>$1</h2>");
    get_h1_pattern()
        .replace_all(&out, "<h1>$1</h1>")
        .into_owned()
}

/// Stage 4: `**bold**` then `*italic*`, shortest match within a line.
///
/// Bold must run first: the single-asterisk rule would otherwise consume
/// half of every double-asterisk delimiter.
pub fn render_emphasis(input: &str) -> String {
    let out = get_bold_pattern().replace_all(input, "<strong>$1</strong>");
    get_italic_pattern()
        .replace_all(&out, "<em>$1</em>")
        .into_owned()
}

/// Body of a fenced block: optional info string dropped, newlines encoded
/// so that later line-based stages leave the block intact.
fn fenced_block(body: &str) -> String {
    let mut code = body;
    let mut language = None;

    if let Some((first, rest)) = body.split_once('\n') {
        let info = first.trim();
        if info
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-' | '.'))
        {
            if !info.is_empty() {
                language = Some(info);
            }
            code = rest;
        }
    }

    let code = code
        .strip_suffix('\n')
        .map(|c| c.strip_suffix('\r').unwrap_or(c))
        .unwrap_or(code);
    let code = get_newline_pattern().replace_all(code, "&#10;");

    match language {
        Some(lang) => format!(
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            lang, code
        ),
        None => format!("<pre><code>{}</code></pre>", code),
    }
}

/// Stage 5: fenced blocks become `<pre><code>`, then single-backtick spans
/// become `<code>`. The inline rule only runs between fenced blocks, so
/// backticks inside a block are never matched on their own. An inline span
/// never crosses a line end, so paragraph splitting cannot cut one open.
pub fn render_code(input: &str) -> String {
    let inline = get_inline_code_pattern();
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for caps in get_fence_pattern().captures_iter(input) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&inline.replace_all(&input[last..whole.start()], "<code>$1</code>"));
        out.push_str(&fenced_block(&caps[1]));
        last = whole.end();
    }
    out.push_str(&inline.replace_all(&input[last..], "<code>$1</code>"));

    out
}

/// Stage 6: `> ` lines become block quotes.
pub fn render_blockquotes(input: &str) -> String {
    get_blockquote_pattern()
        .replace_all(input, "<blockquote>$1</blockquote>")
        .into_owned()
}

/// Whether a segment already starts with a block-level tag
fn starts_with_block_tag(segment: &str) -> bool {
    let Some(rest) = segment.strip_prefix('<') else {
        return false;
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str())
}

/// Stage 7: split on blank lines and wrap every segment that is not already
/// structured in `<p>`. Whitespace-only segments are dropped.
///
/// Expects block-level replacements of stages 1-6 to be done; code blocks
/// carry no raw newlines at this point.
pub fn wrap_paragraphs(input: &str) -> String {
    get_blank_line_pattern()
        .split(input)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if starts_with_block_tag(segment) {
                segment.to_string()
            } else {
                format!("<p>{}</p>", segment)
            }
        })
        .collect()
}

/// Stage 8: any newline left inside a segment becomes a line break.
pub fn convert_line_breaks(input: &str) -> String {
    get_newline_pattern().replace_all(input, "<br>").into_owned()
}
