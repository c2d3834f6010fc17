//! Identifier casing transforms for project names
//!
//! All transforms are total, pure and idempotent on their own output.

/// Convert to snake_case
///
/// Hyphens become underscores. An underscore is inserted before an uppercase
/// letter that follows a lowercase letter or digit, and before the last
/// capital of an acronym that is followed by a lowercase letter, so
/// `MyAPIProject` becomes `my_api_project`.
pub fn to_snake(s: &str) -> String {
    let chars: Vec<char> = s.chars().map(|c| if c == '-' { '_' } else { c }).collect();
    let mut out = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    collapse(&out, '_')
}

/// Convert to kebab-case
///
/// Underscores become hyphens and every uppercase letter after the first
/// character starts a new word, so `MyAPIProject` becomes `my-a-p-i-project`.
pub fn to_kebab(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);

    for (i, c) in s.chars().enumerate() {
        let c = if c == '_' { '-' } else { c };
        if c.is_uppercase() && i > 0 {
            out.push('-');
        }
        out.extend(c.to_lowercase());
    }

    collapse(&out, '-')
}

/// Convert to camelCase
pub fn to_camel(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, part) in segments(s).enumerate() {
        if i == 0 {
            out.push_str(&lower_leading(part));
        } else {
            out.push_str(&capitalize(part));
        }
    }
    out
}

/// Convert to PascalCase
pub fn to_pascal(s: &str) -> String {
    segments(s).map(capitalize).collect()
}

/// Uppercase the first letter of every word, leaving the rest untouched
pub fn to_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric() && c != '\'';
    }
    out
}

/// Non-empty words split on runs of `-`, `_` and whitespace
fn segments(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Lowercase the leading run of capitals; an acronym keeps its last capital
/// when a lowercase word follows (`HTTPServer` -> `httpServer`).
fn lower_leading(part: &str) -> String {
    let chars: Vec<char> = part.chars().collect();
    let run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let followed_by_lower = chars.get(run).is_some_and(|c| c.is_lowercase());
    let lower_count = if run > 1 && followed_by_lower { run - 1 } else { run };

    let mut out = String::with_capacity(part.len());
    for (i, c) in chars.iter().enumerate() {
        if i < lower_count {
            out.extend(c.to_lowercase());
        } else {
            out.push(*c);
        }
    }
    out
}

fn collapse(s: &str, sep: char) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_sep = false;
    for c in s.chars() {
        if c == sep {
            if !last_was_sep {
                out.push(c);
            }
            last_was_sep = true;
        } else {
            out.push(c);
            last_was_sep = false;
        }
    }
    out
}
