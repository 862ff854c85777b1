//! Practical HTML tokenizer for server-rendered fragments.
//!
//! Supported tag-name characters (ASCII only): `[A-Za-z0-9:_-]`.
//! Attribute names use the same class plus `.`, `@` and `[`/`]`-free punctuation
//! commonly found in framework attributes (`sp-on:click`, `data-x.y`).
//!
//! Known limitations:
//! - Not an HTML5 state machine; there is no parse-error recovery beyond
//!   skipping stray `<`.
//! - Raw text is recognized for `script`, `style` and `textarea` only.
use crate::entities::decode_entities;
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_rawtext_element(name: &str) -> bool {
    matches!(name, "script" | "style" | "textarea")
}

fn is_tag_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

fn is_attribute_name_char(c: u8) -> bool {
    !c.is_ascii_whitespace() && !matches!(c, b'=' | b'>' | b'/' | b'"' | b'\'' | b'<')
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

/// Find `</name` followed by optional ASCII whitespace and `>`.
/// Returns the byte range of the whole close tag.
fn find_rawtext_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        i += memchr(b'<', &bytes[i..])?;
        if bytes.get(i + 1) == Some(&b'/')
            && starts_with_ignore_ascii_case_at(bytes, i + 2, name.as_bytes())
        {
            let mut k = i + 2 + name.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if bytes.get(k) == Some(&b'>') {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

/// Tokenize `input` into a flat token list.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    // Slices are only cut at ASCII structural bytes, so every endpoint is a
    // UTF-8 char boundary.
    while i < len {
        if bytes[i] != b'<' {
            let start = i;
            i = memchr(b'<', &bytes[i..]).map_or(len, |rel| i + rel);
            let text = decode_entities(&input[start..i]);
            if !text.is_empty() {
                out.push(Token::Text(text));
            }
            continue;
        }

        if input[i..].starts_with(COMMENT_START) {
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + COMMENT_END.len();
                    continue;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    break;
                }
            }
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let rest = &input[i + 2..];
            let Some(end) = rest.find('>') else {
                break;
            };
            out.push(Token::Doctype(rest[..end].trim().to_string()));
            i += 2 + end + 1;
            continue;
        }

        if bytes.get(i + 1) == Some(&b'/') {
            let start = i + 2;
            let mut j = start;
            while j < len && is_tag_name_char(bytes[j]) {
                j += 1;
            }
            let name = input[start..j].to_ascii_lowercase();
            j = memchr(b'>', &bytes[j..]).map_or(len, |rel| j + rel + 1);
            if !name.is_empty() {
                out.push(Token::EndTag(name));
            }
            i = j;
            continue;
        }

        let start = i + 1;
        let mut j = start;
        while j < len && is_tag_name_char(bytes[j]) {
            j += 1;
        }
        if j == start {
            // A stray `<` that does not open a tag is text.
            out.push(Token::Text("<".to_string()));
            i += 1;
            continue;
        }
        let name = input[start..j].to_ascii_lowercase();
        let (attributes, mut self_closing, after) = scan_attributes(input, j);
        if is_void_element(&name) {
            self_closing = true;
        }
        let rawtext = !self_closing && is_rawtext_element(&name);
        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });
        i = after;

        if rawtext {
            match find_rawtext_close_tag(&input[i..], &name) {
                Some((rel_start, rel_end)) => {
                    let raw = &input[i..i + rel_start];
                    if !raw.is_empty() {
                        let text = if name == "textarea" {
                            decode_entities(raw)
                        } else {
                            raw.to_string()
                        };
                        out.push(Token::Text(text));
                    }
                    out.push(Token::EndTag(name));
                    i += rel_end;
                }
                None => {
                    // Missing close tag: the remainder is raw text.
                    let raw = &input[i..];
                    if !raw.is_empty() {
                        out.push(Token::Text(raw.to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i = len;
                }
            }
        }
    }

    log::trace!(target: "dom.parse", "tokenized {} bytes into {} tokens", len, out.len());
    out
}

/// Scan attributes starting right after the tag name. Returns the attributes,
/// whether the tag was written self-closing, and the index after `>`.
fn scan_attributes(input: &str, mut k: usize) -> (Vec<(String, Option<String>)>, bool, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut attributes: Vec<(String, Option<String>)> = Vec::new();
    let mut self_closing = false;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        match bytes[k] {
            b'>' => {
                k += 1;
                break;
            }
            b'/' => {
                if bytes.get(k + 1) == Some(&b'>') {
                    self_closing = true;
                    k += 2;
                    break;
                }
                k += 1;
                continue;
            }
            _ => {}
        }

        let name_start = k;
        while k < len && is_attribute_name_char(bytes[k]) {
            k += 1;
        }
        if name_start == k {
            k += 1;
            continue;
        }
        let name = input[name_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        let value = if k < len && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let value_start = k;
                k = memchr(quote, &bytes[k..]).map_or(len, |rel| k + rel);
                let raw = &input[value_start..k];
                if k < len {
                    k += 1;
                }
                Some(decode_entities(raw))
            } else {
                let value_start = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    if bytes[k] == b'/' && bytes.get(k + 1) == Some(&b'>') {
                        break;
                    }
                    k += 1;
                }
                Some(decode_entities(&input[value_start..k]))
            }
        } else {
            None
        };

        // Duplicate attributes: the first occurrence wins.
        if !attributes.iter().any(|(existing, _)| *existing == name) {
            attributes.push((name, value));
        }
    }

    (attributes, self_closing, k)
}
