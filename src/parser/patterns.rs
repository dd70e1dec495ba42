//! Text patterns used by the page classifier and segmenter.

use once_cell::sync::Lazy;
use regex::Regex;

/// Copyright and license boilerplate.
pub static LEGAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)all rights reserved|permission is granted|open game license|prior written permission",
    )
    .unwrap()
});

/// Table of contents entry: dot leader followed by a page number.
pub static TOC_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:(?:\.\s?){3,}|…+)\s*\d+\s*$").unwrap());

/// Index entry: capitalized phrase followed by page numbers.
pub static INDEX_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][\w'’ \-]*,\s*\d+(?:\s*,\s*\d+)*\s*$").unwrap());

/// Page number footer ("12", "Page 12", "12 of 40").
pub static PAGE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:page\s*)?\d+(?:\s*(?:of|/)\s*\d+)?\s*$").unwrap());

/// Dice notation with an explicit count ("2d6").
pub static DICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\dd\d+").unwrap());

/// Dice notation with an explicit count, capturing the number of sides.
pub static DICE_SIDES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+d(\d+)\b").unwrap());

/// Runs of digits, replaced when comparing running headers.
pub static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Words that show up together on staff credit pages.
pub const CREDIT_KEYWORDS: &[&str] = &[
    "written by",
    "designed by",
    "editing",
    "editor",
    "cover art",
    "interior art",
    "illustrations",
    "cartography",
    "layout",
    "art direction",
    "art director",
    "playtesters",
    "playtesting",
    "proofreading",
    "producer",
    "special thanks",
];

/// Count credit keywords present in `text`.
pub fn credit_keyword_count(text: &str) -> usize {
    let lower = text.to_lowercase();
    CREDIT_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .count()
}

/// Number of sides of the first dice expression in `text`.
pub fn dice_sides(text: &str) -> Option<usize> {
    DICE_SIDES_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Replace digit runs so page numbers don't break text comparison.
pub fn normalize_digits(text: &str) -> String {
    DIGITS_RE.replace_all(text.trim(), "#").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toc_line() {
        assert!(TOC_LINE_RE.is_match("Chapter One . . . . . 12"));
        assert!(TOC_LINE_RE.is_match("Equipment............45"));
        assert!(!TOC_LINE_RE.is_match("It was 1999."));
    }

    #[test]
    fn test_index_line() {
        assert!(INDEX_LINE_RE.is_match("Goblins, 12, 45"));
        assert!(INDEX_LINE_RE.is_match("Armor class, 7"));
        assert!(!INDEX_LINE_RE.is_match("the goblins, 12"));
        assert!(!INDEX_LINE_RE.is_match("Goblins attack at night."));
    }

    #[test]
    fn test_page_number() {
        assert!(PAGE_NUMBER_RE.is_match("12"));
        assert!(PAGE_NUMBER_RE.is_match("Page 3"));
        assert!(PAGE_NUMBER_RE.is_match("3 of 40"));
        assert!(!PAGE_NUMBER_RE.is_match("Chapter 3"));
    }

    #[test]
    fn test_dice() {
        assert!(DICE_RE.is_match("Roll 2d6"));
        assert!(!DICE_RE.is_match("d6"));
        assert_eq!(dice_sides("1d8 Encounter"), Some(8));
        assert_eq!(dice_sides("Roll 2d12"), Some(12));
        // A bare die size carries no row count
        assert_eq!(dice_sides("Result d6"), None);
        assert_eq!(dice_sides("Result"), None);
    }

    #[test]
    fn test_credit_keywords() {
        assert_eq!(credit_keyword_count("Written by A. Author. Editing: B. Cover Art: C."), 3);
        assert_eq!(credit_keyword_count("The goblins attack."), 0);
    }

    #[test]
    fn test_normalize_digits() {
        assert_eq!(normalize_digits(" Chapter 3 - page 14 "), "Chapter # - page #");
    }

    #[test]
    fn test_legal() {
        assert!(LEGAL_RE.is_match("Copyright 2020. All Rights Reserved."));
        assert!(!LEGAL_RE.is_match("The rights of the king."));
    }
}
