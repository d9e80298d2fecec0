//! Escaping for COPY ... ESCAPE
//!
//! With `ESCAPE`, Redshift treats a backslash as "take the next character
//! literally". Backslash, tab, newline and the field delimiter are prefixed
//! with a backslash so they never split a field or a row.

/// Escape a field value for a tab-delimited COPY row
pub fn escape(text: &str) -> String {
    escape_with(text, '\t')
}

/// Escape a field value for a COPY row using `delimiter`
pub fn escape_with(text: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '\t' | '\n') || c == delimiter {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Reverse [`escape`]: a backslash keeps the following character verbatim
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Split an escaped row (without its trailing newline) into raw fields
pub fn split_escaped(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            current.push(c);
            if let Some(next) = chars.next() {
                current.push(next);
            }
        } else if c == delimiter {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}
