//! Plain text rendering for extracted sections.

use crate::model::Section;

/// Convert sections to plain text.
///
/// Tables use their fixed-width rendering.
pub fn to_text(sections: &[Section]) -> String {
    sections
        .iter()
        .map(Section::display_text)
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paragraph;

    #[test]
    fn test_to_text() {
        let mut section = Section::new(Some("Loot".into()), 1);
        section.add_paragraph(Paragraph::prose(vec!["A chest.".into()], 1));
        section.add_paragraph(Paragraph::table(
            vec!["Roll  Item".into(), "----  ----".into()],
            vec!["| Roll | Item |".into()],
            1,
        ));

        let text = to_text(&[section]);
        assert_eq!(text, "Loot\n\nA chest.\n\nRoll  Item\n----  ----");
    }
}
