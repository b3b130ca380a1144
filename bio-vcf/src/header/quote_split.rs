//! Quote-aware comma/equals splitting for structured `##KEY=<...>` meta
//! lines.
//!
//! Used only for header attribute parsing (spec §4.E design note: "this is
//! explicitly wrong" for record bodies, since VCF record fields never
//! contain quoted commas and are always split on a bare `\t`/`;`/`:`).

/// Split `s` on top-level commas, treating a `"` as toggling "inside a
/// quoted string" so that a comma inside a `Description="a, b"` attribute
/// is not mistaken for a field separator.
pub(crate) fn split_unquoted_commas(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

/// Split one `KEY=VALUE` attribute on its first `=`, stripping a pair of
/// surrounding quotes from `VALUE` if present.
pub(crate) fn split_key_value(attr: &str) -> Option<(&str, String)> {
    let (k, v) = attr.split_once('=')?;
    let v = v.trim();
    let unquoted = if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
        &v[1..v.len() - 1]
    } else {
        v
    };
    Some((k.trim(), unquoted.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_attributes() {
        let parts = split_unquoted_commas("ID=AF,Number=A,Type=Float");
        assert_eq!(parts, vec!["ID=AF", "Number=A", "Type=Float"]);
    }

    #[test]
    fn quoted_comma_is_preserved() {
        let parts = split_unquoted_commas(r#"ID=AF,Description="Allele, Frequency""#);
        assert_eq!(parts, vec!["ID=AF", r#"Description="Allele, Frequency""#]);
    }

    #[test]
    fn split_key_value_strips_quotes() {
        assert_eq!(
            split_key_value(r#"Description="hello""#),
            Some(("Description", "hello".to_string()))
        );
        assert_eq!(split_key_value("ID=AF"), Some(("ID", "AF".to_string())));
    }
}
