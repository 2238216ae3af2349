// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::borrow::Cow;

/// Escapes a string for use in XML text or attribute values.
///
/// The five characters `"`, `'`, `<`, `>` and `&` are replaced with `&quot;`, `&apos;`, `&lt;`,
/// `&gt;` and `&amp;` respectively. Everything else is passed through unchanged, and no allocation
/// happens if nothing needs to be escaped.
pub fn escape(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use test_strategy::proptest;

    #[test_case("\"", "&quot;" ; "double quote")]
    #[test_case("'", "&apos;" ; "single quote")]
    #[test_case("<", "&lt;" ; "less than")]
    #[test_case(">", "&gt;" ; "greater than")]
    #[test_case("&", "&amp;" ; "ampersand")]
    #[test_case("a < b && c > \"d\" 'e'", "a &lt; b &amp;&amp; c &gt; &quot;d&quot; &apos;e&apos;" ; "mixed")]
    #[test_case("plain text\nwith newline", "plain text\nwith newline" ; "untouched")]
    fn escape_table(input: &str, expected: &str) {
        assert_eq!(escape(input), expected);
    }

    #[test]
    fn escape_borrows_when_unchanged() {
        assert!(matches!(escape("nothing to see"), Cow::Borrowed(_)));
    }

    #[proptest(cases = 256)]
    fn escaped_output_has_no_raw_markup(input: String) {
        let escaped = escape(&input);
        assert!(!escaped.contains(['<', '>', '"', '\'']));
        // Every remaining ampersand must start one of the five entities.
        for (idx, _) in escaped.match_indices('&') {
            let rest = &escaped[idx..];
            assert!(
                ["&quot;", "&apos;", "&lt;", "&gt;", "&amp;"]
                    .iter()
                    .any(|entity| rest.starts_with(entity)),
                "stray ampersand in {escaped:?}"
            );
        }
    }
}
