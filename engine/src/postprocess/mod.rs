//! Post-substitution cleanup
//!
//! Substituting blank values into enumerations ("{{NORMA1}}, {{NORMA2}},
//! {{NORMA3}}") leaves orphan separators behind. `clean` repairs them. It is
//! deterministic and idempotent, and only runs on nodes that were modified.

use regex::Regex;
use std::sync::OnceLock;

struct CleanupRules {
    repeated_commas: Regex,
    comma_before_close: Regex,
    whitespace_runs: Regex,
    trailing_comma: Regex,
}

static RULES: OnceLock<CleanupRules> = OnceLock::new();

fn rules() -> &'static CleanupRules {
    RULES.get_or_init(|| CleanupRules {
        repeated_commas: Regex::new(r",(?:\s*,)+").expect("Invalid repeated comma pattern"),
        comma_before_close: Regex::new(r",\s*([.)\n])").expect("Invalid closing comma pattern"),
        whitespace_runs: Regex::new(r"\s{2,}").expect("Invalid whitespace pattern"),
        trailing_comma: Regex::new(r"(?m),\s*$").expect("Invalid trailing comma pattern"),
    })
}

/// Apply the cleanup rules in order:
///
/// 1. `,  ,` runs collapse to a single comma
/// 2. a comma before `.`, `)` or a line break is dropped
/// 3. whitespace runs collapse to one space
/// 4. a comma ending a line is dropped
/// 5. the whole text is trimmed
pub fn clean(text: &str) -> String {
    let rules = rules();

    let text = rules.repeated_commas.replace_all(text, ",");
    let text = rules.comma_before_close.replace_all(&text, "$1");
    let text = rules.whitespace_runs.replace_all(&text, " ");
    let text = rules.trailing_comma.replace_all(&text, "");

    text.trim().to_string()
}
