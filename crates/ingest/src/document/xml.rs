//! Minimal tag-stripping for the XML parts of office archives.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(/?)([^\s/>!?]*)[^>]*?(/?)>").expect("tag regex"))
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("entity regex"))
}

/// Which element names turn into whitespace when their markup is removed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextRules {
    /// Closing tag ends a line (paragraphs, headings).
    pub paragraph: &'static [&'static str],
    /// Opening or empty tag is a line break.
    pub line_break: &'static [&'static str],
    /// Opening or empty tag is a tab.
    pub tab: &'static [&'static str],
    /// Opening or empty tag is a space.
    pub space: &'static [&'static str],
}

/// Strip markup from `xml`, keeping text content with entities decoded.
/// Lines are trimmed and blank lines dropped.
pub(crate) fn xml_to_text(xml: &str, rules: &TextRules) -> String {
    let mut out = String::with_capacity(xml.len() / 2);
    let mut last = 0;

    for caps in tag_regex().captures_iter(xml) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&unescape(&xml[last..whole.start()]));
        last = whole.end();

        let closing = &caps[1] == "/";
        let name = &caps[2];
        if closing {
            if rules.paragraph.contains(&name) {
                out.push('\n');
            }
        } else if rules.line_break.contains(&name) {
            out.push('\n');
        } else if rules.tab.contains(&name) {
            out.push('\t');
        } else if rules.space.contains(&name) {
            out.push(' ');
        }
    }
    out.push_str(&unescape(&xml[last..]));

    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode the five predefined XML entities and numeric character references.
/// Unknown entities are left as written.
pub(crate) fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    entity_regex()
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = match body {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if body.starts_with("#x") => {
                    u32::from_str_radix(&body[2..], 16).ok().and_then(char::from_u32)
                }
                _ if body.starts_with('#') => body[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// First capture of `pattern` in `xml`, entity-decoded and trimmed.
pub(crate) fn first_capture(pattern: &Regex, xml: &str) -> Option<String> {
    pattern
        .captures(xml)
        .and_then(|c| c.get(1))
        .map(|m| unescape(m.as_str()).trim().to_string())
        .filter(|s| !s.is_empty())
}
