//! Inline markup of page bodies.
//!
//! The editing surface hands over HTML-like fragments: text, entities, inline
//! style elements (`span`, `b`, `font`, ...), `<br>` and block wrappers
//! (`div`, `p`) for new lines. This module tokenizes them just enough to
//! lay them out and to cut them in two without losing formatting.
//!
//! Positions inside a fragment are [`TextOffset`]s: indices into the glyph
//! stream produced by [`Markup::glyphs`], where every visible character and
//! every line break is one glyph.

/// Elements that start a new line.
const BLOCK_ELEMENTS: &[&str] = &["div", "p", "li", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Elements without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "wbr", "input", "meta"];

/// `<font size="n">` sizes in pixels for n = 1..=7.
const FONT_TAG_SIZES: [f64; 7] = [10.0, 13.0, 16.0, 18.0, 24.0, 32.0, 48.0];

/// Position in a fragment's glyph stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextOffset(pub usize);

/// One laid-out unit of a fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Glyph {
    /// A visible character with its resolved font size, if overridden.
    Char { ch: char, font_size: Option<f64> },
    /// Forced line break.
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SizeSpec {
    Px(f64),
    Scale(f64),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open {
        name: String,
        raw: String,
        size: Option<SizeSpec>,
        block: bool,
    },
    Close {
        name: String,
        raw: String,
    },
    /// `<br>` or `<hr>`.
    Break { raw: String },
    /// Comments, images and anything else that takes no text space.
    Other { raw: String },
    Text { raw: String },
}

impl Token {
    fn raw(&self) -> &str {
        match self {
            Token::Open { raw, .. }
            | Token::Close { raw, .. }
            | Token::Break { raw }
            | Token::Other { raw }
            | Token::Text { raw } => raw,
        }
    }
}

/// Where a glyph came from: the token, and for text the byte where its
/// character starts. Byte 0 means "at the start of the token".
#[derive(Debug, Clone, Copy)]
struct GlyphSource {
    token: usize,
    byte: usize,
}

/// A tokenized page fragment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Markup {
    tokens: Vec<Token>,
}

impl Markup {
    /// Tokenize a fragment. Never fails: anything unrecognised is text.
    pub fn parse(html: &str) -> Self {
        let mut tokens = Vec::new();
        let mut rest = html;

        while !rest.is_empty() {
            let Some(lt) = rest.find('<') else {
                tokens.push(Token::Text { raw: rest.to_string() });
                break;
            };
            if lt > 0 {
                tokens.push(Token::Text { raw: rest[..lt].to_string() });
                rest = &rest[lt..];
                continue;
            }

            if rest.starts_with("<!--") {
                let end = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
                tokens.push(Token::Other { raw: rest[..end].to_string() });
                rest = &rest[end..];
                continue;
            }

            match rest.find('>') {
                Some(gt) if is_tag_start(rest) => {
                    let raw = &rest[..=gt];
                    tokens.push(classify_tag(raw));
                    rest = &rest[gt + 1..];
                }
                _ => {
                    // A lone '<' is literal text.
                    tokens.push(Token::Text { raw: "<".to_string() });
                    rest = &rest[1..];
                }
            }
        }

        Self { tokens }
    }

    /// Serialize back to the original markup.
    pub fn to_html(&self) -> String {
        self.tokens.iter().map(Token::raw).collect()
    }

    /// Whether the fragment has no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The glyph stream used for layout.
    pub fn glyphs(&self) -> Vec<Glyph> {
        self.glyph_sources().into_iter().map(|(glyph, _)| glyph).collect()
    }

    /// Number of glyphs in the fragment.
    pub fn glyph_count(&self) -> usize {
        self.glyph_sources().len()
    }

    /// Visible text with line breaks as `\n`.
    pub fn plain_text(&self) -> String {
        self.glyphs()
            .into_iter()
            .map(|glyph| match glyph {
                Glyph::Char { ch, .. } => ch,
                Glyph::Break => '\n',
            })
            .collect()
    }

    /// Whether the fragment shows nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// Cut the fragment before glyph `offset`.
    ///
    /// Elements open at the cut are closed at the end of the first half and
    /// reopened at the start of the second, so formatted runs keep their
    /// style on both sides. Offsets at or past the end yield an empty tail.
    pub fn split_at(&self, offset: TextOffset) -> (String, String) {
        let sources = self.glyph_sources();
        let Some(&(_, source)) = sources.get(offset.0) else {
            return (self.to_html(), String::new());
        };

        let (mut cut, byte) = (source.token, source.byte);
        if byte == 0 {
            // Empty wrappers right before the cut belong with the moved text.
            while cut > 0 && matches!(self.tokens[cut - 1], Token::Open { .. }) {
                cut -= 1;
            }
        }

        let open = open_elements(&self.tokens[..cut]);

        let mut head: String = self.tokens[..cut].iter().map(Token::raw).collect();
        let mut tail = String::new();
        for token in &open {
            tail.push_str(token.raw());
        }

        if byte > 0 {
            let raw = self.tokens[cut].raw();
            head.push_str(&raw[..byte]);
            tail.push_str(&raw[byte..]);
            cut += 1;
        }
        for token in &self.tokens[cut..] {
            tail.push_str(token.raw());
        }

        for token in open.iter().rev() {
            if let Token::Open { name, .. } = token {
                head.push_str("</");
                head.push_str(name);
                head.push('>');
            }
        }

        (head, tail)
    }

    fn glyph_sources(&self) -> Vec<(Glyph, GlyphSource)> {
        let mut out: Vec<(Glyph, GlyphSource)> = Vec::new();
        let mut sizes: Vec<(String, Option<f64>)> = Vec::new();
        let mut pending_break = false;

        let ends_line = |out: &Vec<(Glyph, GlyphSource)>| {
            out.is_empty() || matches!(out.last(), Some((Glyph::Break, _)))
        };

        for (index, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Open { name, size, block, .. } => {
                    if *block && !ends_line(&out) {
                        pending_break = true;
                    }
                    let parent = sizes.iter().rev().find_map(|(_, s)| *s);
                    let resolved = match size {
                        Some(SizeSpec::Px(px)) => Some(*px),
                        Some(SizeSpec::Scale(k)) => parent.map(|p| p * k).or(Some(16.0 * k)),
                        None => None,
                    };
                    sizes.push((name.clone(), resolved));
                }
                Token::Close { name, .. } => {
                    if BLOCK_ELEMENTS.contains(&name.as_str()) && !ends_line(&out) {
                        pending_break = true;
                    }
                    if let Some(pos) = sizes.iter().rposition(|(open, _)| open == name) {
                        sizes.truncate(pos);
                    }
                }
                Token::Break { .. } => {
                    if std::mem::take(&mut pending_break) {
                        out.push((Glyph::Break, GlyphSource { token: index, byte: 0 }));
                    }
                    out.push((Glyph::Break, GlyphSource { token: index, byte: 0 }));
                }
                Token::Other { .. } => {}
                Token::Text { raw } => {
                    let font_size = sizes.iter().rev().find_map(|(_, s)| *s);
                    for (byte, ch) in decode_entities(raw) {
                        if std::mem::take(&mut pending_break) {
                            out.push((Glyph::Break, GlyphSource { token: index, byte }));
                        }
                        let ch = if ch == '\n' || ch == '\r' || ch == '\t' { ' ' } else { ch };
                        out.push((Glyph::Char { ch, font_size }, GlyphSource { token: index, byte }));
                    }
                }
            }
        }

        out
    }
}

/// Open elements (outermost first) left unclosed after `tokens`.
fn open_elements(tokens: &[Token]) -> Vec<Token> {
    let mut stack: Vec<Token> = Vec::new();
    for token in tokens {
        match token {
            Token::Open { .. } => stack.push(token.clone()),
            Token::Close { name, .. } => {
                let found = stack
                    .iter()
                    .rposition(|open| matches!(open, Token::Open { name: n, .. } if n == name));
                if let Some(pos) = found {
                    stack.truncate(pos);
                }
            }
            _ => {}
        }
    }
    stack
}

fn is_tag_start(s: &str) -> bool {
    let mut chars = s.chars().skip(1);
    match chars.next() {
        Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        Some('!') => true,
        Some(c) => c.is_ascii_alphabetic(),
        None => false,
    }
}

fn classify_tag(raw: &str) -> Token {
    let inner = raw.trim_start_matches('<').trim_end_matches('>');
    if let Some(closing) = inner.strip_prefix('/') {
        return Token::Close {
            name: tag_name(closing),
            raw: raw.to_string(),
        };
    }
    if inner.starts_with('!') {
        return Token::Other { raw: raw.to_string() };
    }

    let name = tag_name(inner);
    if VOID_ELEMENTS.contains(&name.as_str()) {
        return if name == "br" || name == "hr" {
            Token::Break { raw: raw.to_string() }
        } else {
            Token::Other { raw: raw.to_string() }
        };
    }
    if inner.trim_end().ends_with('/') {
        return Token::Other { raw: raw.to_string() };
    }

    let size = if name == "font" {
        attribute(inner, "size")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .map(|n| SizeSpec::Px(FONT_TAG_SIZES[n.clamp(1, 7) - 1]))
    } else {
        None
    };
    let size = size.or_else(|| attribute(inner, "style").and_then(|style| style_font_size(&style)));

    Token::Open {
        block: BLOCK_ELEMENTS.contains(&name.as_str()),
        name,
        raw: raw.to_string(),
        size,
    }
}

fn tag_name(inner: &str) -> String {
    inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Value of a quoted attribute, case-insensitive on the name.
fn attribute(inner: &str, name: &str) -> Option<String> {
    let lower = inner.to_ascii_lowercase();
    let mut search = 0;
    while let Some(pos) = lower[search..].find(name) {
        let start = search + pos;
        search = start + name.len();
        let preceded = start > 0 && lower.as_bytes()[start - 1].is_ascii_whitespace();
        let rest = lower[search..].trim_start();
        if !preceded || !rest.starts_with('=') {
            continue;
        }
        let value_start = inner.len() - rest.len() + 1;
        let value = inner[value_start..].trim_start();
        let quote = value.chars().next()?;
        return if quote == '"' || quote == '\'' {
            value[1..].find(quote).map(|end| value[1..=end].to_string())
        } else {
            Some(value.split_whitespace().next().unwrap_or("").to_string())
        };
    }
    None
}

fn style_font_size(style: &str) -> Option<SizeSpec> {
    style.split(';').find_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        if !prop.trim().eq_ignore_ascii_case("font-size") {
            return None;
        }
        let value = value.trim().to_ascii_lowercase();
        if let Some(px) = value.strip_suffix("px") {
            px.trim().parse().ok().map(SizeSpec::Px)
        } else if let Some(pt) = value.strip_suffix("pt") {
            pt.trim().parse::<f64>().ok().map(|pt| SizeSpec::Px(pt * 4.0 / 3.0))
        } else if let Some(rem) = value.strip_suffix("rem") {
            rem.trim().parse::<f64>().ok().map(|k| SizeSpec::Px(16.0 * k))
        } else if let Some(em) = value.strip_suffix("em") {
            em.trim().parse().ok().map(SizeSpec::Scale)
        } else {
            value.parse().ok().map(SizeSpec::Px)
        }
    })
}

/// Decode character references, yielding each character with the byte
/// offset where its source text starts.
fn decode_entities(raw: &str) -> Vec<(usize, char)> {
    let mut out = Vec::with_capacity(raw.len());
    let mut iter = raw.char_indices().peekable();

    while let Some((byte, ch)) = iter.next() {
        if ch != '&' {
            out.push((byte, ch));
            continue;
        }
        let entity = raw[byte + 1..]
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&raw[byte + 1..byte + 1 + end]).map(|c| (c, end)));
        match entity {
            Some((decoded, end)) => {
                out.push((byte, decoded));
                let stop = byte + 1 + end;
                while iter.peek().is_some_and(|&(b, _)| b <= stop) {
                    iter.next();
                }
            }
            None => out.push((byte, '&')),
        }
    }

    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
