//! URL patterns such as `/users/:id /users/new *.json`.
//!
//! A pattern is a space-separated list of alternatives. Alternatives starting
//! with `-` exclude matches. `*` matches any run of characters and `:name`
//! captures one path segment. Locations are normalized through [`url::Url`]
//! before matching, so `http://localhost/a/` and `/a` are the same location.

use crate::error::LayerError;
use std::collections::BTreeMap;
use url::Url;

const BASE: &str = "http://localhost/";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Literal(String),
    Wildcard,
    Capture(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Alternative {
    tokens: Vec<Token>,
    with_query: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlPattern {
    include: Vec<Alternative>,
    exclude: Vec<Alternative>,
}

pub type Captures = BTreeMap<String, String>;

impl UrlPattern {
    pub fn parse(pattern: &str) -> Result<Self, LayerError> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        for word in pattern.split_whitespace() {
            match word.strip_prefix('-') {
                Some(rest) => exclude.push(compile(rest, pattern)?),
                None => include.push(compile(word, pattern)?),
            }
        }
        if include.is_empty() {
            return Err(LayerError::InvalidPattern(pattern.to_string()));
        }
        Ok(Self { include, exclude })
    }

    pub fn matches(&self, location: &str) -> bool {
        self.captures(location).is_some()
    }

    /// Named captures of the first matching alternative.
    pub fn captures(&self, location: &str) -> Option<Captures> {
        let location = normalize(location)?;
        if self
            .exclude
            .iter()
            .any(|alt| alt.match_location(&location).is_some())
        {
            return None;
        }
        self.include
            .iter()
            .find_map(|alt| alt.match_location(&location))
    }
}

/// Path plus query of `location`, relative to the local origin, without a
/// trailing slash.
pub fn normalize(location: &str) -> Option<String> {
    let base = Url::parse(BASE).ok()?;
    let url = base.join(location).ok()?;
    let mut path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    let mut out = if url.origin() == base.origin() {
        path
    } else {
        format!("{}{}", url.origin().ascii_serialization(), path)
    };
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    Some(out)
}

fn compile(word: &str, whole: &str) -> Result<Alternative, LayerError> {
    let with_query = word.contains('?');
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = word.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => {
                flush(&mut literal, &mut tokens);
                tokens.push(Token::Wildcard);
            }
            ':' if chars.peek().is_some_and(|c| c.is_ascii_alphabetic()) => {
                flush(&mut literal, &mut tokens);
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                tokens.push(Token::Capture(name));
            }
            _ => literal.push(ch),
        }
    }
    flush(&mut literal, &mut tokens);
    if tokens.is_empty() {
        return Err(LayerError::InvalidPattern(whole.to_string()));
    }
    // Literal-only patterns are locations themselves; normalize them the same way.
    if let [Token::Literal(text)] = tokens.as_slice() {
        let normalized =
            normalize(text).ok_or_else(|| LayerError::InvalidPattern(whole.to_string()))?;
        tokens = vec![Token::Literal(normalized)];
    }
    Ok(Alternative { tokens, with_query })
}

fn flush(literal: &mut String, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}

impl Alternative {
    fn match_location(&self, location: &str) -> Option<Captures> {
        let subject = if self.with_query {
            location
        } else {
            location.split('?').next().unwrap_or(location)
        };
        let mut captures = Captures::new();
        match_tokens(&self.tokens, subject, &mut captures).then_some(captures)
    }
}

fn match_tokens(tokens: &[Token], input: &str, captures: &mut Captures) -> bool {
    let Some((first, rest)) = tokens.split_first() else {
        return input.is_empty();
    };
    match first {
        Token::Literal(text) => input
            .strip_prefix(text.as_str())
            .is_some_and(|tail| match_tokens(rest, tail, captures)),
        Token::Wildcard => input
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(input.len()))
            .any(|split| match_tokens(rest, &input[split..], captures)),
        Token::Capture(name) => {
            let segment_end = input.find(['/', '?', '#']).unwrap_or(input.len());
            for end in (1..=segment_end).rev() {
                if !input.is_char_boundary(end) {
                    continue;
                }
                if match_tokens(rest, &input[end..], captures) {
                    captures.insert(name.clone(), input[..end].to_string());
                    return true;
                }
            }
            false
        }
    }
}
