//! The heading policy: one ordered table of lexical rules.
//!
//! Rules are evaluated top to bottom and the first match decides. Rejections
//! come first, then numbering (authoritative level), then generic heading
//! shapes whose level is read off the font size. Lines matching no rule fall
//! through to the boldness and font-size checks in [`crate::classify`].
//!
//! Bump [`HEADING_POLICY_VERSION`] whenever a rule is added, removed, or
//! reordered, since outlines produced under different versions are not
//! comparable.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::HeadingLevel;

pub const HEADING_POLICY_VERSION: &str = "2";

/// What a matching rule does to the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Never a heading.
    Reject,
    /// Heading at exactly this level, whatever the font size says.
    Level(HeadingLevel),
    /// Heading whose level comes from the size thresholds, or `default` when
    /// the size is not above any threshold.
    SizeDerived { default: HeadingLevel },
}

#[derive(Debug)]
pub enum Matcher {
    Pattern(Regex),
    /// Fewer than half of the characters are word or space characters.
    PunctuationHeavy,
}

impl Matcher {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Pattern(re) => re.is_match(text),
            Matcher::PunctuationHeavy => is_punctuation_heavy(text),
        }
    }
}

#[derive(Debug)]
pub struct PolicyRule {
    pub name: &'static str,
    pub matcher: Matcher,
    pub action: RuleAction,
}

#[derive(Debug)]
pub struct HeadingPolicy {
    pub version: &'static str,
    pub rules: Vec<PolicyRule>,
}

impl HeadingPolicy {
    /// First rule matching `text`, if any.
    pub fn first_match(&self, text: &str) -> Option<&PolicyRule> {
        self.rules.iter().find(|rule| rule.matcher.matches(text))
    }
}

fn is_punctuation_heavy(text: &str) -> bool {
    let total = text.chars().count();
    let wordish = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .count();
    (wordish as f64) < (total as f64) * 0.5
}

/// `(name, pattern, action)` rows of the table, in evaluation order.
const PATTERN_TABLE: &[(&str, &str, RuleAction)] = &[
    ("numeric", r"^[\d\s.,%]+$", RuleAction::Reject),
    ("date", r"^\d{1,2}[/-]\d{1,2}[/-]\d{2,4}$", RuleAction::Reject),
    ("date", r"^\d{4}[/.-]\d{1,2}[/.-]\d{1,2}$", RuleAction::Reject),
    (
        "date",
        r"(?i)^(jan(uary)?|feb(ruary)?|mar(ch)?|apr(il)?|may|june?|july?|aug(ust)?|sept?(ember)?|oct(ober)?|nov(ember)?|dec(ember)?)\.?\s+\d{1,2}(st|nd|rd|th)?,?\s+\d{4}$",
        RuleAction::Reject,
    ),
    (
        "date",
        r"(?i)^\d{1,2}(st|nd|rd|th)?\s+(jan(uary)?|feb(ruary)?|mar(ch)?|apr(il)?|may|june?|july?|aug(ust)?|sept?(ember)?|oct(ober)?|nov(ember)?|dec(ember)?)\.?,?\s+\d{4}$",
        RuleAction::Reject,
    ),
    (
        "date",
        r"(?i)^(jan(uary)?|feb(ruary)?|mar(ch)?|apr(il)?|may|june?|july?|aug(ust)?|sept?(ember)?|oct(ober)?|nov(ember)?|dec(ember)?)\.?,?\s+\d{4}$",
        RuleAction::Reject,
    ),
    ("url", r"(?i)https?://|^www\.", RuleAction::Reject),
    ("email", r"^[\w.+-]+@[\w-]+\.", RuleAction::Reject),
    ("currency", r"^[$€£¥]\s?\d", RuleAction::Reject),
    ("page-number", r"(?i)^page\s+\d+", RuleAction::Reject),
    (
        "numbered-h3",
        r"^\d+\.\d+\.\d+",
        RuleAction::Level(HeadingLevel::H3),
    ),
    ("numbered-h2", r"^\d+\.\d+", RuleAction::Level(HeadingLevel::H2)),
    ("numbered-h1", r"^\d+\.?\s", RuleAction::Level(HeadingLevel::H1)),
    (
        "chapter",
        r"(?i)^chapter\s+(\d+|[ivxlcdm]+)\b",
        RuleAction::SizeDerived {
            default: HeadingLevel::H2,
        },
    ),
    (
        "section",
        r"(?i)^section\s+\d+",
        RuleAction::SizeDerived {
            default: HeadingLevel::H2,
        },
    ),
    (
        "all-caps",
        r"^\p{Lu}[\p{Lu}\s]+$",
        RuleAction::SizeDerived {
            default: HeadingLevel::H2,
        },
    ),
    (
        "word-number",
        r"^\p{Lu}\w*\s+\d+",
        RuleAction::SizeDerived {
            default: HeadingLevel::H2,
        },
    ),
];

fn build_policy() -> HeadingPolicy {
    let mut rules: Vec<PolicyRule> = Vec::with_capacity(PATTERN_TABLE.len() + 1);

    for &(name, pattern, action) in PATTERN_TABLE {
        rules.push(PolicyRule {
            name,
            matcher: Matcher::Pattern(Regex::new(pattern).unwrap()),
            action,
        });
        // The punctuation filter closes the rejection block.
        if name == "page-number" {
            rules.push(PolicyRule {
                name: "punctuation",
                matcher: Matcher::PunctuationHeavy,
                action: RuleAction::Reject,
            });
        }
    }

    HeadingPolicy {
        version: HEADING_POLICY_VERSION,
        rules,
    }
}

/// The process-wide policy, compiled on first use.
pub fn heading_policy() -> &'static HeadingPolicy {
    static POLICY: OnceLock<HeadingPolicy> = OnceLock::new();
    POLICY.get_or_init(build_policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_for(text: &str) -> Option<&'static str> {
        heading_policy().first_match(text).map(|r| r.name)
    }

    #[test]
    fn test_all_patterns_compile() {
        let policy = heading_policy();
        assert_eq!(policy.version, HEADING_POLICY_VERSION);
        assert_eq!(policy.rules.len(), PATTERN_TABLE.len() + 1);
    }

    #[test]
    fn test_rejections_precede_levels() {
        let policy = heading_policy();
        let first_level = policy
            .rules
            .iter()
            .position(|r| r.action != RuleAction::Reject)
            .unwrap();
        assert!(policy.rules[first_level..]
            .iter()
            .all(|r| r.action != RuleAction::Reject));
    }

    #[test]
    fn test_rejection_rules() {
        assert_eq!(rule_for("42"), Some("numeric"));
        assert_eq!(rule_for("3.14"), Some("numeric"));
        assert_eq!(rule_for("12/05/2023"), Some("date"));
        assert_eq!(rule_for("March 21, 2024"), Some("date"));
        assert_eq!(rule_for("15 March 2024"), Some("date"));
        assert_eq!(rule_for("1st Sept. 2023"), Some("date"));
        assert_eq!(rule_for("March 2024"), Some("date"));
        assert_eq!(rule_for("DECEMBER 2019"), Some("date"));
        assert_eq!(rule_for("2024-03-15"), Some("date"));
        assert_eq!(rule_for("See https://example.com"), Some("url"));
        assert_eq!(rule_for("www.example.com"), Some("url"));
        assert_eq!(rule_for("jane.doe@example.com"), Some("email"));
        assert_eq!(rule_for("$100 per seat"), Some("currency"));
        assert_eq!(rule_for("Page 4"), Some("page-number"));
        assert_eq!(rule_for("page 12 of 30"), Some("page-number"));
        assert_eq!(rule_for("-- * -- * --"), Some("punctuation"));
    }

    #[test]
    fn test_numbering_rules() {
        assert_eq!(rule_for("1.2.3 Details"), Some("numbered-h3"));
        assert_eq!(rule_for("1.2 Background"), Some("numbered-h2"));
        assert_eq!(rule_for("2. Scope"), Some("numbered-h1"));
        assert_eq!(rule_for("3 Methods"), Some("numbered-h1"));
    }

    #[test]
    fn test_generic_shapes() {
        assert_eq!(rule_for("Chapter 3 Results"), Some("chapter"));
        assert_eq!(rule_for("CHAPTER IV"), Some("chapter"));
        assert_eq!(rule_for("Section 2"), Some("section"));
        assert_eq!(rule_for("INTRODUCTION"), Some("all-caps"));
        assert_eq!(rule_for("TABLE OF CONTENTS"), Some("all-caps"));
        assert_eq!(rule_for("Appendix 3"), Some("word-number"));
    }

    #[test]
    fn test_month_prefixed_words_are_not_dates() {
        assert_eq!(rule_for("Marketing 2024"), Some("word-number"));
        assert_eq!(rule_for("Mayor 12"), Some("word-number"));
        assert_eq!(rule_for("2024 Annual Review"), Some("numbered-h1"));
    }

    #[test]
    fn test_plain_prose_matches_nothing() {
        assert_eq!(rule_for("The quick brown fox jumps over the lazy dog."), None);
        assert_eq!(rule_for("Introduction"), None);
    }

    #[test]
    fn test_punctuation_heavy() {
        assert!(is_punctuation_heavy("....."));
        assert!(is_punctuation_heavy("a.-.-.-"));
        assert!(!is_punctuation_heavy("Hello, world!"));
        assert!(!is_punctuation_heavy("1.2.3 Details"));
    }
}
