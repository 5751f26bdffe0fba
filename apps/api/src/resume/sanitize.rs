//! LaTeX escaping and the markdown-like formatting accepted in summaries and
//! description items.
//!
//! Plain fields go through [`escape_latex`]. Markdown fields go through
//! [`markdown_to_latex`] instead, never both: it escapes `\ { }` up front, inserts
//! its commands, then escapes the remaining special characters, none of which
//! appear in the inserted commands.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Replacement for each of the 10 LaTeX special characters.
fn latex_replacement(c: char) -> Option<&'static str> {
    Some(match c {
        '&' => r"\&",
        '%' => r"\%",
        '$' => r"\$",
        '#' => r"\#",
        '_' => r"\_",
        '{' => r"\{",
        '}' => r"\}",
        '~' => r"\textasciitilde{}",
        '^' => r"\textasciicircum{}",
        '\\' => r"\textbackslash{}",
        _ => return None,
    })
}

/// Escapes every LaTeX special character in a single pass, so replacements are
/// never escaped twice.
pub fn escape_latex(text: &str) -> String {
    escape_chars(text, |_| true)
}

fn escape_chars(text: &str, include: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match latex_replacement(c) {
            Some(rep) if include(c) => out.push_str(rep),
            _ => out.push(c),
        }
    }
    out
}

/// Characters used by the commands markdown conversion inserts.
fn is_command_char(c: char) -> bool {
    matches!(c, '\\' | '{' | '}')
}

/// Delimiters of the placeholder that stands in for a link while the rest of
/// the text is converted. Private-use code points, stripped from input.
const LINK_OPEN: char = '\u{E000}';
const LINK_CLOSE: char = '\u{E001}';

struct MarkdownRules {
    link: Regex,
    link_token: Regex,
    h3: Regex,
    h2: Regex,
    h1: Regex,
    bullet: Regex,
    numbered: Regex,
    bold_star: Regex,
    bold_under: Regex,
    italic_star: Regex,
    italic_under: Regex,
    strike: Regex,
}

fn rules() -> &'static MarkdownRules {
    static RULES: OnceLock<MarkdownRules> = OnceLock::new();
    RULES.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("markdown pattern is valid");
        MarkdownRules {
            link: re(r"\[(.*?)\]\((.*?)\)"),
            link_token: re("\u{E000}(\\d+)\u{E001}"),
            h3: re(r"(?m)^###\s+(.*?)$"),
            h2: re(r"(?m)^##\s+(.*?)$"),
            h1: re(r"(?m)^#\s+(.*?)$"),
            bullet: re(r"(?m)^\s*[-*+]\s+(.*?)$"),
            numbered: re(r"(?m)^\s*\d+\.\s+(.*?)$"),
            bold_star: re(r"\*\*(.*?)\*\*"),
            bold_under: re(r"__(.*?)__"),
            italic_star: re(r"\*(.*?)\*"),
            italic_under: re(r"_(.*?)_"),
            strike: re(r"~~(.*?)~~"),
        }
    })
}

/// Converts markdown-like text to LaTeX: bold, italic, strikethrough, list
/// lines, `#` headers and `[text](url)` links.
pub fn markdown_to_latex(text: &str) -> String {
    let rules = rules();
    let text: String = text
        .chars()
        .filter(|c| *c != LINK_OPEN && *c != LINK_CLOSE)
        .collect();

    // Links become opaque tokens so emphasis may span them.
    let mut links = Vec::new();
    let masked = rules.link.replace_all(&text, |caps: &Captures| {
        links.push(format!(
            r"\href{{{}}}{{{}}}",
            escape_url(&caps[2]),
            convert_segment(&caps[1])
        ));
        format!("{LINK_OPEN}{}{LINK_CLOSE}", links.len() - 1)
    });

    let converted = convert_segment(&masked);
    if links.is_empty() {
        return converted;
    }
    rules
        .link_token
        .replace_all(&converted, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| links.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

/// Converts text whose links have already been replaced by tokens.
fn convert_segment(segment: &str) -> String {
    if segment.is_empty() {
        return String::new();
    }
    let rules = rules();

    let text = escape_chars(segment, is_command_char);

    let text = rules.h3.replace_all(&text, r"\subsubsection*{${1}}");
    let text = rules.h2.replace_all(&text, r"\subsection*{${1}}");
    let text = rules.h1.replace_all(&text, r"\section*{${1}}");
    let text = rules.bullet.replace_all(&text, r"\item ${1}");
    let text = rules.numbered.replace_all(&text, r"\item ${1}");

    let text = rules.bold_star.replace_all(&text, r"\textbf{${1}}");
    let text = rules.bold_under.replace_all(&text, r"\textbf{${1}}");
    let text = rules.italic_star.replace_all(&text, r"\textit{${1}}");
    let text = rules.italic_under.replace_all(&text, r"\textit{${1}}");
    let text = rules.strike.replace_all(&text, r"\sout{${1}}");

    escape_chars(&text, |c| !is_command_char(c))
}

/// URLs keep their structure; only characters hyperref cannot take raw are escaped.
fn escape_url(url: &str) -> String {
    url.replace('%', r"\%").replace('#', r"\#")
}
