//! Generic field-name heuristics.
//!
//! Used only for keys the schema registry does not list.

/// Inserts `_` wherever a lowercase letter or digit is followed by an
/// uppercase letter, collapses doubled underscores and lowercases the rest.
///
/// `dataNascimento` becomes `data_nascimento`; `nome` is returned unchanged.
#[must_use]
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            out.push('_');
        }
        out.push(c);
        prev = Some(c);
    }
    while out.contains("__") {
        out = out.replace("__", "_");
    }
    out.to_lowercase()
}

/// Drops each `_` that precedes a lowercase letter and uppercases that
/// letter. Other underscores are kept.
///
/// `data_nascimento` becomes `dataNascimento`; `turma_1` is unchanged.
#[must_use]
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_lowercase) {
                out.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}
