//! Rewrite steps for pseudo-English rules
//!
//! Authored rules read like `IF (...) THEN X SHALL = 'Y' ELSE 'N'`. Before a
//! rule can be parsed it goes through literal rewrites declared by the
//! function and its variables, then through the fixed keyword table below.
//! Literal rewrites are plain substring replacements applied in declaration
//! order, so an earlier rewrite can change what a later one matches.

use prefill_core::ast::RewriteDeclaration;

/// Fixed keyword table, applied in this order
pub const TOKEN_TABLE: &[(&str, &str)] = &[
    ("IF", "if"),
    ("AND", "&&"),
    ("OR", "||"),
    ("NOT", "!"),
    ("SHALL", ""),
    ("THEN", "{"),
    ("ELSE", "} else {"),
    (",", ""),
];

/// Apply literal `from` -> `to` rewrites in order. Empty `from` is ignored.
pub fn apply_rewrites(text: &str, rewrites: &[RewriteDeclaration]) -> String {
    let mut out = text.to_string();
    for rewrite in rewrites {
        if rewrite.from.is_empty() {
            log::debug!("Ignoring rewrite with empty pattern (to = '{}')", rewrite.to);
            continue;
        }
        out = out.replace(&rewrite.from, &rewrite.to);
    }
    out
}

/// Apply [`TOKEN_TABLE`].
///
/// Keywords are replaced as whole words and commas are dropped, in both
/// cases only outside quoted string literals.
pub fn apply_token_table(text: &str) -> String {
    TOKEN_TABLE
        .iter()
        .fold(text.to_string(), |acc, (from, to)| replace_token(&acc, from, to))
}

fn replace_token(text: &str, from: &str, to: &str) -> String {
    let is_word = from.chars().all(|c| c.is_ascii_alphabetic());
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        if !word.is_empty() {
            if word == from {
                out.push_str(to);
            } else {
                out.push_str(word);
            }
            word.clear();
        }
    };

    for c in text.chars() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        if is_word && (c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            word.push(c);
            continue;
        }
        flush(&mut word, &mut out);

        if c == '\'' || c == '"' {
            quote = Some(c);
            out.push(c);
        } else if !is_word && from.len() == c.len_utf8() && from.starts_with(c) {
            out.push_str(to);
        } else {
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_rewrites_in_order() {
        let rewrites = vec![
            RewriteDeclaration::new("$A", "$B"),
            RewriteDeclaration::new("$B", "x"),
        ];
        assert_eq!(apply_rewrites("$A + $B", &rewrites), "x + x");
    }

    #[test]
    fn test_token_table_translates_keywords() {
        let out = apply_token_table("IF (a AND NOT b) THEN 'Z' SHALL = 'Y' ELSE 'N'");
        assert_eq!(out, "if (a && ! b) { 'Z'  = 'Y' } else { 'N'");
    }

    #[test]
    fn test_token_table_respects_word_boundaries() {
        assert_eq!(apply_token_table("SPECIFIED OR IFX"), "SPECIFIED || IFX");
    }

    #[test]
    fn test_token_table_leaves_quoted_text_alone() {
        assert_eq!(
            apply_token_table("x == 'IF THEN, ELSE' OR y"),
            "x == 'IF THEN, ELSE' || y"
        );
    }

    #[test]
    fn test_escaped_quote_keeps_string_open() {
        assert_eq!(
            apply_token_table(r"x == 'it\'s IF, THEN' AND y"),
            r"x == 'it\'s IF, THEN' && y"
        );
    }

    #[test]
    fn test_commas_are_dropped() {
        assert_eq!(apply_token_table("a, b,c"), "a bc");
    }
}
