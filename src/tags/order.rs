//! Mixed alphanumeric tag ordering
//!
//! Tags are split into runs of digits and non-digits. Runs are compared
//! pairwise: numbers by value, text with a locale-style collation, and a
//! number against text by the configured facet precedence.

use crate::error::{RegistryError, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

/// Order applied when the configuration string is empty
pub const DEFAULT_TAGLIST_ORDER: &str = "alpha-asc;num-desc";

/// Comparator policy derived from a taglist order string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaglistOrder {
    /// Numeric runs sort before alphabetic runs at the same position
    pub num_first: bool,
    pub num_asc: bool,
    pub alpha_asc: bool,
}

impl Default for TaglistOrder {
    fn default() -> Self {
        Self {
            num_first: false,
            num_asc: false,
            alpha_asc: true,
        }
    }
}

impl FromStr for TaglistOrder {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        parse_order(s)
    }
}

/// Expand shorthands into the explicit two-facet form
pub fn order_variant(value: &str) -> Result<String> {
    match value {
        "" => Ok(DEFAULT_TAGLIST_ORDER.to_string()),
        "desc" => Ok("alpha-desc;num-desc".to_string()),
        "asc" => Ok("num-asc;alpha-asc".to_string()),
        "alpha-asc" | "alpha-desc" => Ok(format!("{};num-asc", value)),
        "num-asc" | "num-desc" => Ok(format!("{};alpha-asc", value)),
        other if is_explicit_order(other) => Ok(other.to_string()),
        other => Err(RegistryError::InvalidFormat(format!(
            "The taglist order `{}` is not recognized.",
            other
        ))),
    }
}

fn is_direction(value: &str) -> bool {
    value == "asc" || value == "desc"
}

/// `alpha-X;num-Y` or `num-X;alpha-Y`
fn is_explicit_order(value: &str) -> bool {
    let Some((first, second)) = value.split_once(';') else {
        return false;
    };
    let (Some((f1, d1)), Some((f2, d2))) = (first.split_once('-'), second.split_once('-')) else {
        return false;
    };
    let facets_ok = (f1 == "alpha" && f2 == "num") || (f1 == "num" && f2 == "alpha");
    facets_ok && is_direction(d1) && is_direction(d2)
}

/// Parse an order setting such as `num-desc;alpha-asc`
pub fn parse_order(value: &str) -> Result<TaglistOrder> {
    let variant = order_variant(value)?;
    let mut order = TaglistOrder {
        num_first: false,
        num_asc: true,
        alpha_asc: true,
    };

    for (idx, facet) in variant.split(';').enumerate() {
        let Some((name, direction)) = facet.split_once('-') else {
            continue;
        };
        let asc = direction == "asc";
        match name {
            "num" => order.num_asc = asc,
            "alpha" => order.alpha_asc = asc,
            _ => {}
        }
        if idx == 0 {
            order.num_first = name == "num";
        }
    }

    Ok(order)
}

/// One run of a tokenized tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Digit run, stored without leading zeros so any length compares exactly
    Num(String),
    Alpha(String),
}

impl Token {
    fn number(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        Token::Num(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() })
    }
}

/// Split a tag into maximal digit and non-digit runs, e.g.
/// `v10.2beta` becomes `v`, `10`, `.`, `2`, `beta`
pub fn tokenize(tag: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for c in tag.chars() {
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            tokens.push(finish_run(&current, current_is_digit));
            current.clear();
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(finish_run(&current, current_is_digit));
    }

    tokens
}

fn finish_run(run: &str, is_digit: bool) -> Token {
    if is_digit {
        Token::number(run)
    } else {
        Token::Alpha(run.to_string())
    }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Collation close to a browser's default `localeCompare`: punctuation
/// before letters, letters case-insensitively, then lower case before
/// upper case
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let primary = |c: char| -> (u8, char) {
        if c.is_alphanumeric() {
            (1, c.to_lowercase().next().unwrap_or(c))
        } else {
            (0, c)
        }
    };

    let by_primary = a.chars().map(primary).cmp(b.chars().map(primary));
    if by_primary != Ordering::Equal {
        return by_primary;
    }

    let tertiary = |c: char| if c.is_uppercase() { 1u8 } else { 0u8 };
    a.chars()
        .map(tertiary)
        .cmp(b.chars().map(tertiary))
        .then_with(|| a.cmp(b))
}

impl TaglistOrder {
    fn apply(&self, a: &Token, b: &Token) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let num_first = if self.num_first { Ordering::Less } else { Ordering::Greater };

        match (a, b) {
            (Token::Num(x), Token::Num(y)) => {
                let ord = compare_numbers(x, y);
                if self.num_asc { ord } else { ord.reverse() }
            }
            (Token::Num(_), Token::Alpha(_)) => num_first,
            (Token::Alpha(_), Token::Num(_)) => num_first.reverse(),
            (Token::Alpha(x), Token::Alpha(y)) => {
                let ord = locale_compare(x, y);
                if self.alpha_asc { ord } else { ord.reverse() }
            }
        }
    }

    /// Compare two tags. When one token sequence is a prefix of the other,
    /// the shorter tag sorts first, length counted in UTF-16 units.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let tokens_a = tokenize(a);
        let tokens_b = tokenize(b);

        for (x, y) in tokens_a.iter().zip(tokens_b.iter()) {
            let ord = self.apply(x, y);
            if ord != Ordering::Equal {
                return ord;
            }
        }

        a.encode_utf16().count().cmp(&b.encode_utf16().count())
    }

    /// Sort any records by their tag string
    pub fn sort_by_tag<T, F>(&self, items: &mut [T], tag: F)
    where
        F: Fn(&T) -> &str,
    {
        items.sort_by(|x, y| self.compare(tag(x), tag(y)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(order: &TaglistOrder, tags: &[&str]) -> Vec<String> {
        let mut tags: Vec<String> = tags.iter().map(|s| s.to_string()).collect();
        order.sort_by_tag(&mut tags, |t| t.as_str());
        tags
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(parse_order("").unwrap(), TaglistOrder::default());
        assert_eq!(
            parse_order("asc").unwrap(),
            TaglistOrder { num_first: true, num_asc: true, alpha_asc: true }
        );
        assert_eq!(
            parse_order("desc").unwrap(),
            TaglistOrder { num_first: false, num_asc: false, alpha_asc: false }
        );
        assert_eq!(
            parse_order("num-desc").unwrap(),
            TaglistOrder { num_first: true, num_asc: false, alpha_asc: true }
        );
        assert_eq!(
            parse_order("alpha-desc").unwrap(),
            TaglistOrder { num_first: false, num_asc: true, alpha_asc: false }
        );
        assert_eq!(
            parse_order("num-asc;alpha-desc").unwrap(),
            TaglistOrder { num_first: true, num_asc: true, alpha_asc: false }
        );
        assert_eq!("alpha-asc;num-asc".parse::<TaglistOrder>().unwrap().num_asc, true);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        for bad in ["foo", "alpha-up", "num-asc;num-desc", "alpha-asc;", "alpha-asc;num-desc;x"] {
            assert!(
                matches!(parse_order(bad), Err(RegistryError::InvalidFormat(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("v10.2beta"),
            vec![
                Token::Alpha("v".to_string()),
                Token::Num("10".to_string()),
                Token::Alpha(".".to_string()),
                Token::Num("2".to_string()),
                Token::Alpha("beta".to_string()),
            ]
        );
        assert_eq!(tokenize(""), Vec::<Token>::new());
        assert_eq!(tokenize("007"), vec![Token::Num("7".to_string())]);
    }

    #[test]
    fn test_prefix_tie_counts_utf16_units() {
        let order = TaglistOrder::default();
        // same token prefix; equal in chars, but the emoji takes two UTF-16 units
        assert_eq!(order.compare("000x", "0x1\u{1F600}"), Ordering::Less);
        assert_eq!(order.compare("0x1\u{1F600}", "000x"), Ordering::Greater);
    }

    #[test]
    fn test_default_order() {
        let order = TaglistOrder::default();
        assert_eq!(sorted(&order, &["2", "10", "latest"]), vec!["latest", "10", "2"]);
        assert_eq!(
            sorted(&order, &["v1", "v10", "v2", "latest"]),
            vec!["latest", "v10", "v2", "v1"]
        );
    }

    #[test]
    fn test_numeric_ascending_orders() {
        let order = parse_order("alpha-asc;num-asc").unwrap();
        assert_eq!(sorted(&order, &["2", "10", "latest"]), vec!["latest", "2", "10"]);
        assert_eq!(
            sorted(&order, &["v1", "v10", "v2", "latest"]),
            vec!["latest", "v1", "v2", "v10"]
        );

        let order = parse_order("asc").unwrap();
        assert_eq!(sorted(&order, &["latest", "10", "2"]), vec!["2", "10", "latest"]);
    }

    #[test]
    fn test_desc_reverses_asc() {
        let tags = ["1.0", "1.10", "1.2", "latest", "beta", "2"];
        let mut asc = sorted(&parse_order("asc").unwrap(), &tags);
        let desc = sorted(&parse_order("desc").unwrap(), &tags);
        asc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_prefix_tie_break_uses_length() {
        let order = TaglistOrder::default();
        assert_eq!(order.compare("1.0", "1.0-rc1"), Ordering::Less);
        assert_eq!(order.compare("1", "01"), Ordering::Less);
        assert_eq!(order.compare("abc", "abc"), Ordering::Equal);
    }

    #[test]
    fn test_large_numbers_compare_exactly() {
        let order = parse_order("num-asc").unwrap();
        assert_eq!(
            order.compare("20240101000000000001", "20240101000000000002"),
            Ordering::Less
        );
    }

    #[test]
    fn test_compare_is_antisymmetric_and_transitive() {
        let tags = ["latest", "v1", "v1.0", "v10", "v2", "1", "10", "2", "alpha", "Alpha", "1-alpine", "-"];
        for value in ["", "asc", "desc", "num-asc;alpha-desc"] {
            let order = parse_order(value).unwrap();
            for a in tags {
                for b in tags {
                    assert_eq!(order.compare(a, b), order.compare(b, a).reverse());
                    for c in tags {
                        if order.compare(a, b) != Ordering::Greater
                            && order.compare(b, c) != Ordering::Greater
                        {
                            assert_ne!(order.compare(a, c), Ordering::Greater, "{} {} {}", a, b, c);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_locale_compare() {
        assert_eq!(locale_compare("a", "B"), Ordering::Less);
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("-", "a"), Ordering::Less);
        assert_eq!(locale_compare("beta", "alpha"), Ordering::Greater);
    }
}
