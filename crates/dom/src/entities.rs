/// Decode the small entity set the fragment tokenizer understands.
///
/// Contract:
/// - Named entities: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
/// - Numeric entities only when semicolon-terminated: `&#123;` and `&#x7B;`.
/// - Anything else (unknown names, missing `;`, invalid scalars) passes through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    const NAMED: [(&str, char); 6] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&apos;", '\''),
        ("&nbsp;", '\u{00A0}'),
    ];
    // 0x10FFFF / 1114111
    const MAX_HEX_DIGITS: usize = 6;
    const MAX_DEC_DIGITS: usize = 7;

    if memchr::memchr(b'&', s.as_bytes()).is_none() {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        if let Some((name, ch)) = NAMED.iter().find(|(name, _)| tail.starts_with(name)) {
            out.push(*ch);
            rest = &tail[name.len()..];
            continue;
        }

        if let Some((ch, consumed)) = numeric_entity(tail, MAX_HEX_DIGITS, MAX_DEC_DIGITS) {
            out.push(ch);
            rest = &tail[consumed..];
            continue;
        }

        out.push('&');
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

/// Parses `&#123;` / `&#x7B;` at the start of `s`, returning the char and consumed length.
fn numeric_entity(s: &str, max_hex: usize, max_dec: usize) -> Option<(char, usize)> {
    let body = s.strip_prefix("&#")?;
    let (digits, radix, prefix_len, max) = match body.as_bytes().first() {
        Some(b'x' | b'X') => (&body[1..], 16, 3, max_hex),
        _ => (body, 10, 2, max_dec),
    };
    let end = digits.find(';')?;
    if end == 0 || end > max {
        return None;
    }
    let digits = &digits[..end];
    let valid = if radix == 16 {
        digits.bytes().all(|b| b.is_ascii_hexdigit())
    } else {
        digits.bytes().all(|b| b.is_ascii_digit())
    };
    if !valid {
        return None;
    }
    let ch = u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)?;
    Some((ch, prefix_len + end + 1))
}

/// Escape text for serialization inside element content.
pub(crate) fn escape_text(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Escape an attribute value for serialization inside double quotes.
pub(crate) fn escape_attribute(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
