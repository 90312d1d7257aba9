//! Heading classification for a single line.
//!
//! Decision order:
//!
//! 1. Length bounds.
//! 2. The ordered rule table in [`crate::policy`] (rejections, numbering,
//!    generic heading shapes).
//! 3. Bold and larger than body text: size level, else H3.
//! 4. Font size alone.
//!
//! Classification is a pure function of the line and the document's
//! [`FontProfile`]; nothing is remembered between calls.

use crate::config::OutlineConfig;
use crate::policy::{heading_policy, RuleAction};
use crate::types::{FontProfile, HeadingLevel, Line};

/// Outcome of classifying one line, with the name of the deciding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub level: Option<HeadingLevel>,
    pub rule: &'static str,
}

impl Decision {
    fn heading(level: HeadingLevel, rule: &'static str) -> Self {
        Decision {
            level: Some(level),
            rule,
        }
    }

    fn rejected(rule: &'static str) -> Self {
        Decision { level: None, rule }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HeadingClassifier {
    profile: FontProfile,
    max_chars: usize,
}

impl HeadingClassifier {
    pub fn new(profile: FontProfile, config: &OutlineConfig) -> Self {
        HeadingClassifier {
            profile,
            max_chars: config.max_heading_chars,
        }
    }

    pub fn classify(&self, line: &Line) -> Option<HeadingLevel> {
        self.explain(line).level
    }

    pub fn explain(&self, line: &Line) -> Decision {
        let text = line.text.trim();
        let len = text.chars().count();
        if len < 2 || len > self.max_chars {
            return Decision::rejected("length");
        }

        let size_level = self.profile.level_for_size(line.font_size);

        if let Some(rule) = heading_policy().first_match(text) {
            return match rule.action {
                RuleAction::Reject => Decision::rejected(rule.name),
                RuleAction::Level(level) => Decision::heading(level, rule.name),
                RuleAction::SizeDerived { default } => {
                    Decision::heading(size_level.unwrap_or(default), rule.name)
                }
            };
        }

        if line.is_bold && line.font_size > self.profile.body_size {
            return Decision::heading(size_level.unwrap_or(HeadingLevel::H3), "bold");
        }

        match size_level {
            Some(level) => Decision::heading(level, "font-size"),
            None => Decision::rejected("body"),
        }
    }
}
