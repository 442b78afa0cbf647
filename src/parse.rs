//! Helpers shared by the text parsers.

use crate::error::{ChronotopeError, Result};

/// Strip one pair of enclosing braces.
pub(crate) fn strip_braces<'a>(text: &'a str, what: &str) -> Result<&'a str> {
    text.trim()
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .ok_or_else(|| ChronotopeError::TextInput(format!("Could not parse {} '{}'", what, text)))
}

/// Split on commas outside brackets, parentheses and double quotes.
pub(crate) fn split_top_level(text: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if in_quotes {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ChronotopeError::TextInput(format!(
                        "Unbalanced brackets in '{}'",
                        text
                    )));
                }
            }
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || in_quotes {
        return Err(ChronotopeError::TextInput(format!(
            "Unbalanced brackets or quotes in '{}'",
            text
        )));
    }
    parts.push(text[start..].trim());
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ChronotopeError::TextInput(format!(
            "Empty element in '{}'",
            text
        )));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_nesting() {
        let parts = split_top_level("[1, 2), (3, 4], 5").unwrap();
        assert_eq!(parts, vec!["[1, 2)", "(3, 4]", "5"]);
    }

    #[test]
    fn test_split_respects_quotes() {
        let parts = split_top_level(r#""a,b"@t1, "c\"d"@t2"#).unwrap();
        assert_eq!(parts, vec![r#""a,b"@t1"#, r#""c\"d"@t2"#]);
    }

    #[test]
    fn test_split_rejects_malformed() {
        assert!(split_top_level("[1, 2").is_err());
        assert!(split_top_level("1,,2").is_err());
        assert!(split_top_level("\"open").is_err());
        assert_eq!(strip_braces(" {1, 2} ", "set").unwrap(), "1, 2");
        assert!(strip_braces("1, 2}", "set").is_err());
    }
}
