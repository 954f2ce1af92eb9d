//! Embedded fonts and text measurement.
//!
//! Reports are set in DejaVu Sans, which is embedded into every PDF so that
//! Greek, Cyrillic and accented Latin names print as typed. Layout measures
//! text with the same glyph advances the PDF viewer will use.

use std::collections::BTreeSet;

use ttf_parser::Face;

use crate::error::{Error, Result};

/// DejaVu Sans Book.
pub(crate) const REGULAR_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// DejaVu Sans Bold.
pub(crate) const BOLD_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

const PT_TO_MM: f32 = 25.4 / 72.0;

/// Glyph advances of the regular and bold report faces.
pub struct TextMetrics {
    regular: Face<'static>,
    bold: Face<'static>,
}

impl std::fmt::Debug for TextMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextMetrics")
            .field("regular_glyphs", &self.regular.number_of_glyphs())
            .field("bold_glyphs", &self.bold.number_of_glyphs())
            .finish()
    }
}

impl TextMetrics {
    /// Parse the embedded faces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pdf`] if a face cannot be parsed.
    pub fn load() -> Result<Self> {
        let parse = |bytes: &'static [u8], name: &str| {
            Face::parse(bytes, 0).map_err(|e| Error::pdf(format!("{name} font: {e}")))
        };
        Ok(Self {
            regular: parse(REGULAR_TTF, "regular")?,
            bold: parse(BOLD_TTF, "bold")?,
        })
    }

    fn face(&self, bold: bool) -> &Face<'static> {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    /// Width of `text` set at `size_pt`, in millimetres.
    ///
    /// Characters the face has no glyph for are not drawn and take no space.
    #[must_use]
    pub fn width_mm(&self, text: &str, size_pt: f32, bold: bool) -> f32 {
        let face = self.face(bold);
        let units: u32 = text
            .chars()
            .filter_map(|c| face.glyph_index(c))
            .filter_map(|id| face.glyph_hor_advance(id))
            .map(u32::from)
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let em = units as f32 / f32::from(face.units_per_em());
        em * size_pt * PT_TO_MM
    }

    /// Characters of `text` the face cannot draw.
    #[must_use]
    pub fn missing_chars(&self, text: &str, bold: bool) -> BTreeSet<char> {
        let face = self.face(bold);
        text.chars()
            .filter(|c| !c.is_whitespace() && face.glyph_index(*c).is_none())
            .collect()
    }

    /// Word-wrap `text` so that no line is wider than `max_width_mm`.
    ///
    /// Existing line breaks are kept, blank lines included. Words wider than
    /// a line are split between characters; a single glyph wider than the
    /// line still gets a line of its own.
    #[must_use]
    pub fn wrap(&self, text: &str, max_width_mm: f32, size_pt: f32, bold: bool) -> Vec<String> {
        let fits = |line: &str| self.width_mm(line, size_pt, bold) <= max_width_mm;
        let mut lines = Vec::new();

        for paragraph in text.lines() {
            let mut current = String::new();

            for word in paragraph.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{current} {word}")
                };
                if fits(&candidate) {
                    current = candidate;
                    continue;
                }
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                if fits(word) {
                    current = word.to_string();
                    continue;
                }

                for ch in word.chars() {
                    current.push(ch);
                    if !fits(&current) && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::replace(&mut current, ch.to_string()));
                    }
                }
            }
            lines.push(current);
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> TextMetrics {
        TextMetrics::load().unwrap()
    }

    #[test]
    fn test_width_grows_with_text_and_size() {
        let m = metrics();
        let short = m.width_mm("Room", 11.0, false);
        assert!(short > 0.0);
        assert!(m.width_mm("Room not ready", 11.0, false) > short);
        assert!((m.width_mm("Room", 22.0, false) - 2.0 * short).abs() < 1e-3);
        assert!(m.width_mm("Room", 11.0, true) > short);
        assert!(m.width_mm("", 11.0, false).abs() < f32::EPSILON);
    }

    #[test]
    fn test_capitals_are_wider_than_lowercase() {
        let m = metrics();
        assert!(m.width_mm("WWWW", 11.0, false) > m.width_mm("iiii", 11.0, false) * 3.0);
    }

    #[test]
    fn test_wrap_keeps_every_line_within_width() {
        let m = metrics();
        let text = "THE ROOM WAS NOT READY WHEN WE ARRIVED AND THE RECEPTION STAFF \
                    REFUSED TO OFFER ANY ALTERNATIVE ACCOMMODATION OR COMPENSATION";
        let lines = m.wrap(text, 60.0, 11.0, false);

        assert!(lines.len() > 2);
        for line in &lines {
            assert!(m.width_mm(line, 11.0, false) <= 60.0, "too wide: {line}");
        }
        assert_eq!(
            lines.join(" ").split_whitespace().collect::<Vec<_>>(),
            text.split_whitespace().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_wrap_keeps_paragraphs() {
        let m = metrics();
        let lines = m.wrap("short\n\nend", 100.0, 11.0, false);
        assert_eq!(lines, vec!["short", "", "end"]);
        assert!(m.wrap("", 100.0, 11.0, false).is_empty());
    }

    #[test]
    fn test_wrap_splits_words_wider_than_a_line() {
        let m = metrics();
        let word = "konstantinos.papadopoulos@travel-example-agency.com";
        let lines = m.wrap(word, 30.0, 11.0, false);

        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(m.width_mm(line, 11.0, false) <= 30.0);
        }
    }

    #[test]
    fn test_wrap_tiny_width_still_terminates() {
        let m = metrics();
        let lines = m.wrap("ab", 0.1, 11.0, false);
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_greek_and_cyrillic_have_glyphs() {
        let m = metrics();
        let name = "Ελένη Παπαδοπούλου";
        assert!(m.missing_chars(name, false).is_empty());
        assert!(m.missing_chars(name, true).is_empty());
        assert!(m.missing_chars("Ольга Иванова", false).is_empty());
        assert!(m.width_mm(name, 11.0, false) > 0.0);
    }

    #[test]
    fn test_missing_chars_reported() {
        let m = metrics();
        let missing = m.missing_chars("Name: 山田", false);
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!['山', '田']);
    }
}
