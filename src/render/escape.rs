//! HTML escaping helpers shared by the codec and the markdown renderer.

/// Escape text for injection into HTML.
///
/// An `&` that already begins a well-formed character reference (`&amp;`,
/// `&#39;`, `&#x2F;` ...) is kept as is, so escaping text that was escaped
/// upstream never produces `&amp;amp;`. Entities cannot open tags, so this
/// leaves no markup path open.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for (idx, ch) in text.char_indices() {
        match ch {
            '&' if starts_with_entity(&text[idx..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Strict escape used for code: every special character is replaced,
/// including an `&` that looks like an entity and the `/` of closing tags.
pub fn escape_code_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape HTML source for display: every `&` is escaped, so references the
/// author wrote show up literally instead of being decoded by the browser.
/// `/` stays readable.
pub fn escape_source(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Decode the named and numeric references produced by the escapers above,
/// plus `&nbsp;` and arbitrary numeric references. Unknown names stay as is.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_one(rest) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Heuristic for "this code was entity-escaped before it reached us":
/// it carries `&lt;` or `&gt;` and no literal `<` at all.
pub fn looks_entity_escaped(code: &str) -> bool {
    (code.contains("&lt;") || code.contains("&gt;")) && !code.contains('<')
}

fn entity_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'&') {
        return None;
    }
    let mut i = 1;
    if bytes.get(i) == Some(&b'#') {
        i += 1;
        let hex = matches!(bytes.get(i), Some(b'x' | b'X'));
        if hex {
            i += 1;
        }
        let start = i;
        while i < bytes.len()
            && (if hex {
                bytes[i].is_ascii_hexdigit()
            } else {
                bytes[i].is_ascii_digit()
            })
        {
            i += 1;
        }
        let digits = i - start;
        let max = if hex { 6 } else { 7 };
        if digits == 0 || digits > max {
            return None;
        }
    } else {
        let start = i;
        if !bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
            return None;
        }
        while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
            i += 1;
        }
        if i - start > 32 {
            return None;
        }
    }
    (bytes.get(i) == Some(&b';')).then_some(i + 1)
}

fn starts_with_entity(s: &str) -> bool {
    entity_len(s).is_some()
}

fn decode_one(s: &str) -> Option<(char, usize)> {
    let len = entity_len(s)?;
    let body = &s[1..len - 1];
    let decoded = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let numeric = body.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((decoded, len))
}
