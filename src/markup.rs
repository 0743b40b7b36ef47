//! Inline markup used inside text cells.
//!
//! Supported tags: `<b>`/`<strong>`, `<i>`/`<em>`, `<u>`,
//! `<color rgb='RRGGBB'>` and `<link href='URL'>`/`<a href='URL'>`, nested
//! freely. Entities `&lt; &gt; &amp; &quot; &apos;` are decoded. Anything that
//! does not parse as a known tag is kept as literal text.

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<[u8; 3]>,
    pub link: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

#[derive(Clone, Debug, PartialEq)]
enum Tag {
    Bold,
    Italic,
    Underline,
    Color([u8; 3]),
    Link(String),
}

impl Tag {
    fn name(&self) -> &'static str {
        match self {
            Tag::Bold => "b",
            Tag::Italic => "i",
            Tag::Underline => "u",
            Tag::Color(_) => "color",
            Tag::Link(_) => "link",
        }
    }
}

fn canonical_name(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "b" | "strong" => Some("b"),
        "i" | "em" => Some("i"),
        "u" => Some("u"),
        "color" => Some("color"),
        "link" | "a" => Some("link"),
        _ => None,
    }
}

/// Parse `RRGGBB` (optionally prefixed with `#`) into an RGB triple.
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Extract `key='value'` or `key="value"` from a tag's attribute text.
fn attribute(attrs: &str, key: &str) -> Option<String> {
    let mut rest = attrs;
    while let Some(pos) = rest.find(key) {
        let after = rest[pos + key.len()..].trim_start();
        let boundary_ok = pos == 0
            || rest[..pos]
                .chars()
                .last()
                .is_some_and(|c| c.is_whitespace());
        if boundary_ok && let Some(value) = after.strip_prefix('=') {
            let value = value.trim_start();
            let quote = value.chars().next()?;
            if quote == '\'' || quote == '"' {
                let inner = &value[1..];
                let end = inner.find(quote)?;
                return Some(decode_entities(&inner[..end]));
            }
            let end = value
                .find(|c: char| c.is_whitespace())
                .unwrap_or(value.len());
            return Some(decode_entities(&value[..end]));
        }
        rest = &rest[pos + key.len()..];
    }
    None
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = [
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&amp;", '&'),
            ("&quot;", '"'),
            ("&apos;", '\''),
        ]
        .iter()
        .find(|(entity, _)| tail.starts_with(entity));
        match decoded {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

enum Token {
    Open(Tag),
    Close(&'static str),
}

/// Try to read a tag at the start of `s` (which begins with `<`).
/// Returns the token and the number of bytes consumed.
fn read_tag(s: &str) -> Option<(Token, usize)> {
    let end = s.find('>')?;
    if s[1..end].contains('<') {
        return None;
    }
    let inner = s[1..end].trim();
    if let Some(name) = inner.strip_prefix('/') {
        let name = canonical_name(name.trim())?;
        return Some((Token::Close(name), end + 1));
    }
    let (name, attrs) = match inner.find(char::is_whitespace) {
        Some(i) => (&inner[..i], inner[i..].trim()),
        None => (inner, ""),
    };
    let tag = match canonical_name(name)? {
        "b" => Tag::Bold,
        "i" => Tag::Italic,
        "u" => Tag::Underline,
        "color" => Tag::Color(parse_hex_color(&attribute(attrs, "rgb")?)?),
        "link" => Tag::Link(attribute(attrs, "href")?),
        _ => return None,
    };
    Some((Token::Open(tag), end + 1))
}

fn style_for(stack: &[Tag]) -> SpanStyle {
    let mut style = SpanStyle::default();
    for tag in stack {
        match tag {
            Tag::Bold => style.bold = true,
            Tag::Italic => style.italic = true,
            Tag::Underline => style.underline = true,
            Tag::Color(c) => style.color = Some(*c),
            Tag::Link(url) => style.link = Some(url.clone()),
        }
    }
    style
}

fn push_text(spans: &mut Vec<Span>, text: &str, stack: &[Tag]) {
    if text.is_empty() {
        return;
    }
    let text = decode_entities(text);
    let style = style_for(stack);
    match spans.last_mut() {
        Some(last) if last.style == style => last.text.push_str(&text),
        _ => spans.push(Span { text, style }),
    }
}

/// Parse marked-up text into styled spans. Adjacent text with identical
/// style is merged into one span.
pub fn parse(input: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut stack: Vec<Tag> = Vec::new();
    let mut literal_start = 0usize;
    let mut pos = 0usize;

    while let Some(offset) = input[pos..].find('<') {
        let at = pos + offset;
        match read_tag(&input[at..]) {
            Some((token, consumed)) => {
                push_text(&mut spans, &input[literal_start..at], &stack);
                match token {
                    Token::Open(tag) => stack.push(tag),
                    Token::Close(name) => {
                        if let Some(idx) = stack.iter().rposition(|t| t.name() == name) {
                            stack.truncate(idx);
                        }
                    }
                }
                pos = at + consumed;
                literal_start = pos;
            }
            None => pos = at + 1,
        }
    }
    push_text(&mut spans, &input[literal_start..], &stack);
    spans
}

/// A single unstyled span holding `text` verbatim.
pub fn literal(text: &str) -> Vec<Span> {
    if text.is_empty() {
        return Vec::new();
    }
    vec![Span {
        text: text.to_string(),
        style: SpanStyle::default(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_one_span() {
        let spans = parse("Invoice #42");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Invoice #42");
        assert_eq!(spans[0].style, SpanStyle::default());
    }

    #[test]
    fn nested_link_color_bold() {
        let spans = parse(
            "Contact us: <color rgb='326d92'><link href='mailto:a@acme.com'><b>a@acme.com</b></link></color>",
        );
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Contact us: ");
        let email = &spans[1];
        assert_eq!(email.text, "a@acme.com");
        assert!(email.style.bold);
        assert_eq!(email.style.color, Some([0x32, 0x6d, 0x92]));
        assert_eq!(email.style.link.as_deref(), Some("mailto:a@acme.com"));
    }

    #[test]
    fn closing_tag_pops_to_matching_open() {
        let spans = parse("<b>bold <i>both</b> plain</i>");
        assert_eq!(spans[0].text, "bold ");
        assert!(spans[0].style.bold && !spans[0].style.italic);
        assert_eq!(spans[1].text, "both");
        assert!(spans[1].style.bold && spans[1].style.italic);
        assert_eq!(spans[2].text, " plain");
        assert_eq!(spans[2].style, SpanStyle::default());
    }

    #[test]
    fn unknown_and_malformed_tags_stay_literal() {
        let spans = parse("a <blink>b</blink> < c <color rgb='zz'>d");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "a <blink>b</blink> < c <color rgb='zz'>d");
    }

    #[test]
    fn stray_angle_bracket_before_a_tag_is_kept() {
        let spans = parse("a < b <b>x</b>");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "a < b ");
        assert_eq!(spans[0].style, SpanStyle::default());
        assert_eq!(spans[1].text, "x");
        assert!(spans[1].style.bold);
    }

    #[test]
    fn unclosed_tag_runs_to_end() {
        let spans = parse("x <b>y z");
        assert_eq!(spans.len(), 2);
        assert!(spans[1].style.bold);
        assert_eq!(spans[1].text, "y z");
    }

    #[test]
    fn entities_and_double_quotes() {
        let spans = parse(r#"<a href="https://pay/1?a=1&amp;b=2">&lt;Pay&gt;</a>"#);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "<Pay>");
        assert_eq!(spans[0].style.link.as_deref(), Some("https://pay/1?a=1&b=2"));
    }

    #[test]
    fn hex_color_accepts_hash_prefix() {
        assert_eq!(parse_hex_color("#FFFFFF"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("3C3D3A"), Some([0x3c, 0x3d, 0x3a]));
        assert_eq!(parse_hex_color("fff"), None);
    }
}
