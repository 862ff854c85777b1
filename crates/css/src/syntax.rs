//! Selector grammar.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! conditions (`[a]`, `=`, `~=`, `^=`, `$=`, `*=`, `|=`), `:not(...)` and the
//! four combinators. Anything else is rejected with a [`SelectorError`].

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    Empty,
    /// Unbalanced brackets, parentheses or quotes.
    Unbalanced(String),
    /// A character sequence that does not form a selector.
    Invalid(String),
    UnsupportedPseudo(String),
    /// A target expression used a placement suffix we do not know.
    UnknownPlacement(String),
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty selector"),
            Self::Unbalanced(s) => write!(f, "unbalanced selector: {s}"),
            Self::Invalid(s) => write!(f, "invalid selector: {s}"),
            Self::UnsupportedPseudo(s) => write!(f, "unsupported pseudo-class :{s}"),
            Self::UnknownPlacement(s) => write!(f, "unknown placement :{s}"),
        }
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    Includes { key: String, value: String },
    DashMatch { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
}

impl AttrCondition {
    pub fn key(&self) -> &str {
        match self {
            Self::Exists { key }
            | Self::Eq { key, .. }
            | Self::Includes { key, .. }
            | Self::DashMatch { key, .. }
            | Self::StartsWith { key, .. }
            | Self::EndsWith { key, .. }
            | Self::Contains { key, .. } => key,
        }
    }

    pub(crate) fn test(&self, actual: &str) -> bool {
        match self {
            Self::Exists { .. } => true,
            Self::Eq { value, .. } => actual == value,
            Self::Includes { value, .. } => actual.split_whitespace().any(|t| t == value),
            Self::DashMatch { value, .. } => {
                actual == value
                    || actual
                        .strip_prefix(value.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            Self::StartsWith { value, .. } => !value.is_empty() && actual.starts_with(value),
            Self::EndsWith { value, .. } => !value.is_empty() && actual.ends_with(value),
            Self::Contains { value, .. } => !value.is_empty() && actual.contains(value),
        }
    }
}

/// One compound selector, e.g. `div.card[sp-keep]:not(.old)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// Lowercased tag name; `None` for `*` or when omitted.
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrCondition>,
    pub negations: Vec<SelectorList>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

/// A compound plus its relation to the compound on its left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub compound: Compound,
    pub combinator: Option<Combinator>,
}

/// A sequence of compounds joined by combinators, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub parts: Vec<Part>,
}

/// Comma-separated selector groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }
        let selectors = split_top_level(source, ',')?
            .into_iter()
            .map(|group| parse_complex(&group))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: source.to_string(),
            selectors,
        })
    }

    /// The selector text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl SelectorList {
    /// For descendant-style selectors like `.card .title`, a list of their
    /// leading compounds (`.card`). `None` when no selector has more than one
    /// compound.
    pub fn leading_compounds(&self) -> Option<SelectorList> {
        let selectors: Vec<ComplexSelector> = self
            .selectors
            .iter()
            .filter(|s| s.parts.len() > 1)
            .map(|s| ComplexSelector {
                parts: vec![Part {
                    compound: s.parts[0].compound.clone(),
                    combinator: None,
                }],
            })
            .collect();
        if selectors.is_empty() {
            return None;
        }
        let source = selectors
            .iter()
            .map(|s| s.parts[0].compound.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Some(SelectorList { source, selectors })
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => f.write_str(tag)?,
            None if self.id.is_none()
                && self.classes.is_empty()
                && self.attrs.is_empty()
                && self.negations.is_empty() =>
            {
                f.write_str("*")?
            }
            None => {}
        }
        if let Some(id) = &self.id {
            write!(f, "#{}", escape_ident(id))?;
        }
        for class in &self.classes {
            write!(f, ".{}", escape_ident(class))?;
        }
        for attr in &self.attrs {
            let (op, value) = match attr {
                AttrCondition::Exists { key } => {
                    write!(f, "[{key}]")?;
                    continue;
                }
                AttrCondition::Eq { value, .. } => ("=", value),
                AttrCondition::Includes { value, .. } => ("~=", value),
                AttrCondition::DashMatch { value, .. } => ("|=", value),
                AttrCondition::StartsWith { value, .. } => ("^=", value),
                AttrCondition::EndsWith { value, .. } => ("$=", value),
                AttrCondition::Contains { value, .. } => ("*=", value),
            };
            write!(f, "[{}{op}{}]", attr.key(), quote_value(value))?;
        }
        for negated in &self.negations {
            write!(f, ":not({negated})")?;
        }
        Ok(())
    }
}

/// Split `input` on `sep` where it is not nested in brackets, parentheses or
/// quotes. Empty groups are an error.
pub fn split_top_level(input: &str, sep: char) -> Result<Vec<String>, SelectorError> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut scanner = NestingScanner::default();

    for ch in input.chars() {
        if ch == sep && scanner.at_top_level() {
            let trimmed = current.trim();
            if trimmed.is_empty() {
                return Err(SelectorError::Invalid(input.to_string()));
            }
            groups.push(trimmed.to_string());
            current.clear();
            continue;
        }
        scanner
            .feed(ch)
            .map_err(|()| SelectorError::Unbalanced(input.to_string()))?;
        current.push(ch);
    }
    if !scanner.at_top_level() {
        return Err(SelectorError::Unbalanced(input.to_string()));
    }
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(SelectorError::Invalid(input.to_string()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

/// Tracks bracket/paren depth and quoted strings while scanning selector text.
#[derive(Default)]
struct NestingScanner {
    brackets: usize,
    parens: usize,
    quote: Option<char>,
    escaped: bool,
}

impl NestingScanner {
    fn at_top_level(&self) -> bool {
        self.brackets == 0 && self.parens == 0 && self.quote.is_none() && !self.escaped
    }

    fn feed(&mut self, ch: char) -> Result<(), ()> {
        if self.escaped {
            self.escaped = false;
            return Ok(());
        }
        if ch == '\\' {
            self.escaped = true;
            return Ok(());
        }
        if let Some(q) = self.quote {
            if ch == q {
                self.quote = None;
            }
            return Ok(());
        }
        match ch {
            '"' | '\'' => self.quote = Some(ch),
            '[' => self.brackets += 1,
            ']' => self.brackets = self.brackets.checked_sub(1).ok_or(())?,
            '(' => self.parens += 1,
            ')' => self.parens = self.parens.checked_sub(1).ok_or(())?,
            _ => {}
        }
        Ok(())
    }
}

enum ChainToken {
    Compound(String),
    Combinator(Combinator),
}

fn tokenize_chain(selector: &str) -> Result<Vec<ChainToken>, SelectorError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut scanner = NestingScanner::default();

    let flush = |current: &mut String, tokens: &mut Vec<ChainToken>| {
        if !current.is_empty() {
            tokens.push(ChainToken::Compound(std::mem::take(current)));
        }
    };

    for ch in selector.chars() {
        if scanner.at_top_level() {
            let combinator = match ch {
                '>' => Some(Combinator::Child),
                '+' => Some(Combinator::NextSibling),
                '~' => Some(Combinator::SubsequentSibling),
                _ => None,
            };
            if let Some(combinator) = combinator {
                flush(&mut current, &mut tokens);
                tokens.push(ChainToken::Combinator(combinator));
                continue;
            }
            if ch.is_ascii_whitespace() {
                flush(&mut current, &mut tokens);
                continue;
            }
        }
        scanner
            .feed(ch)
            .map_err(|()| SelectorError::Unbalanced(selector.to_string()))?;
        current.push(ch);
    }
    if !scanner.at_top_level() {
        return Err(SelectorError::Unbalanced(selector.to_string()));
    }
    flush(&mut current, &mut tokens);
    Ok(tokens)
}

fn parse_complex(selector: &str) -> Result<ComplexSelector, SelectorError> {
    let mut parts: Vec<Part> = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize_chain(selector)? {
        match token {
            ChainToken::Combinator(combinator) => {
                if pending.is_some() || parts.is_empty() {
                    return Err(SelectorError::Invalid(selector.to_string()));
                }
                pending = Some(combinator);
            }
            ChainToken::Compound(text) => {
                let compound = parse_compound(&text)?;
                let combinator = if parts.is_empty() {
                    None
                } else {
                    Some(pending.take().unwrap_or(Combinator::Descendant))
                };
                parts.push(Part {
                    compound,
                    combinator,
                });
            }
        }
    }
    if parts.is_empty() || pending.is_some() {
        return Err(SelectorError::Invalid(selector.to_string()));
    }
    Ok(ComplexSelector { parts })
}

fn parse_compound(part: &str) -> Result<Compound, SelectorError> {
    let invalid = || SelectorError::Invalid(part.to_string());
    let chars: Vec<char> = part.chars().collect();
    let mut i = 0;
    let mut compound = Compound::default();
    let mut universal = false;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                if universal || compound.tag.is_some() || i != 0 {
                    return Err(invalid());
                }
                universal = true;
                i += 1;
            }
            '#' => {
                let (id, next) = parse_ident(&chars, i + 1).ok_or_else(invalid)?;
                if compound.id.replace(id).is_some() {
                    return Err(invalid());
                }
                i = next;
            }
            '.' => {
                let (class, next) = parse_ident(&chars, i + 1).ok_or_else(invalid)?;
                compound.classes.push(class);
                i = next;
            }
            '[' => {
                let (condition, next) = parse_attr_condition(&chars, i).ok_or_else(invalid)?;
                compound.attrs.push(condition);
                i = next;
            }
            ':' => {
                let (name, next) = parse_ident(&chars, i + 1).ok_or_else(invalid)?;
                if !name.eq_ignore_ascii_case("not") || chars.get(next) != Some(&'(') {
                    return Err(SelectorError::UnsupportedPseudo(name));
                }
                let close = matching_paren(&chars, next).ok_or_else(invalid)?;
                let inner: String = chars[next + 1..close].iter().collect();
                compound.negations.push(SelectorList::parse(&inner)?);
                i = close + 1;
            }
            _ => {
                if i != 0 {
                    return Err(invalid());
                }
                let (tag, next) = parse_ident(&chars, i).ok_or_else(invalid)?;
                compound.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }
    Ok(compound)
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

/// Parse an identifier at `start`, resolving backslash escapes.
fn parse_ident(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut i = start;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' {
            let escaped = *chars.get(i + 1)?;
            out.push(escaped);
            i += 2;
        } else if is_ident_char(ch) {
            out.push(ch);
            i += 1;
        } else {
            break;
        }
    }
    if out.is_empty() { None } else { Some((out, i)) }
}

fn matching_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut i = open;
    while i < chars.len() {
        let ch = chars[i];
        match (quote, ch) {
            (_, '\\') => i += 1,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parse `[key]` or `[key<op>value]` starting at the opening bracket.
fn parse_attr_condition(chars: &[char], open: usize) -> Option<(AttrCondition, usize)> {
    let mut i = open + 1;
    skip_ws(chars, &mut i);
    let (key, next) = parse_ident(chars, i)?;
    let key = key.to_ascii_lowercase();
    i = next;
    skip_ws(chars, &mut i);

    if chars.get(i) == Some(&']') {
        return Some((AttrCondition::Exists { key }, i + 1));
    }

    let op = match chars.get(i)? {
        '=' => {
            i += 1;
            '='
        }
        c @ ('~' | '|' | '^' | '$' | '*') if chars.get(i + 1) == Some(&'=') => {
            i += 2;
            *c
        }
        _ => return None,
    };
    skip_ws(chars, &mut i);
    let (value, next) = parse_attr_value(chars, i)?;
    i = next;
    skip_ws(chars, &mut i);
    if chars.get(i) != Some(&']') {
        return None;
    }

    let condition = match op {
        '=' => AttrCondition::Eq { key, value },
        '~' => AttrCondition::Includes { key, value },
        '|' => AttrCondition::DashMatch { key, value },
        '^' => AttrCondition::StartsWith { key, value },
        '$' => AttrCondition::EndsWith { key, value },
        _ => AttrCondition::Contains { key, value },
    };
    Some((condition, i + 1))
}

fn parse_attr_value(chars: &[char], start: usize) -> Option<(String, usize)> {
    match chars.get(start)? {
        q @ ('"' | '\'') => {
            let mut out = String::new();
            let mut i = start + 1;
            loop {
                let ch = *chars.get(i)?;
                if ch == '\\' {
                    out.push(*chars.get(i + 1)?);
                    i += 2;
                } else if ch == *q {
                    return Some((out, i + 1));
                } else {
                    out.push(ch);
                    i += 1;
                }
            }
        }
        _ => parse_ident(chars, start),
    }
}

fn skip_ws(chars: &[char], i: &mut usize) {
    while chars.get(*i).is_some_and(|c| c.is_ascii_whitespace()) {
        *i += 1;
    }
}

/// Escape `value` so it parses back as a single identifier.
pub fn escape_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.chars().enumerate() {
        let needs_escape = !is_ident_char(ch) || (i == 0 && ch.is_ascii_digit());
        if needs_escape {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Quote `value` for use inside an attribute condition.
pub fn quote_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_with_everything() {
        let list = SelectorList::parse(r#"div#main.a.b[sp-keep][name="x y"]:not(.old)"#).unwrap();
        let compound = &list.selectors[0].parts[0].compound;
        assert_eq!(compound.tag.as_deref(), Some("div"));
        assert_eq!(compound.id.as_deref(), Some("main"));
        assert_eq!(compound.classes, vec!["a", "b"]);
        assert_eq!(compound.attrs.len(), 2);
        assert_eq!(
            compound.attrs[1],
            AttrCondition::Eq {
                key: "name".into(),
                value: "x y".into()
            }
        );
        assert_eq!(compound.negations.len(), 1);
    }

    #[test]
    fn parses_combinators_without_spaces() {
        let list = SelectorList::parse("ul>li+li~li a").unwrap();
        let combinators: Vec<_> = list.selectors[0]
            .parts
            .iter()
            .map(|p| p.combinator)
            .collect();
        assert_eq!(
            combinators,
            vec![
                None,
                Some(Combinator::Child),
                Some(Combinator::NextSibling),
                Some(Combinator::SubsequentSibling),
                Some(Combinator::Descendant),
            ]
        );
    }

    #[test]
    fn commas_inside_not_and_quotes_do_not_split() {
        let list = SelectorList::parse(r#"a:not(.x, .y), [title="a,b"]"#).unwrap();
        assert_eq!(list.selectors.len(), 2);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(SelectorList::parse("  "), Err(SelectorError::Empty));
        assert!(matches!(
            SelectorList::parse("div["),
            Err(SelectorError::Unbalanced(_))
        ));
        assert!(matches!(
            SelectorList::parse("> div"),
            Err(SelectorError::Invalid(_))
        ));
        assert!(matches!(
            SelectorList::parse("a, , b"),
            Err(SelectorError::Invalid(_))
        ));
        assert_eq!(
            SelectorList::parse("li:first-child"),
            Err(SelectorError::UnsupportedPseudo("first-child".into()))
        );
    }

    #[test]
    fn leading_compounds_of_descendant_selectors() {
        let list = SelectorList::parse(r#".card [title="a b"] , main, ul#x.y > li"#).unwrap();
        let leading = list.leading_compounds().unwrap();
        assert_eq!(leading.as_str(), ".card, ul#x.y");
        assert_eq!(leading.selectors.len(), 2);
        assert!(SelectorList::parse("main").unwrap().leading_compounds().is_none());
    }

    #[test]
    fn escaped_identifiers_round_trip() {
        let escaped = escape_ident("md:flex");
        assert_eq!(escaped, r"md\:flex");
        let list = SelectorList::parse(&format!(".{escaped}")).unwrap();
        assert_eq!(list.selectors[0].parts[0].compound.classes, vec!["md:flex"]);

        let quoted = quote_value(r#"say "hi""#);
        let list = SelectorList::parse(&format!("[title={quoted}]")).unwrap();
        assert_eq!(
            list.selectors[0].parts[0].compound.attrs[0],
            AttrCondition::Eq {
                key: "title".into(),
                value: r#"say "hi""#.into()
            }
        );
    }
}
