//! Glyph metrics: the pluggable width-measurement contract and the built-in estimator.

pub mod layout;
pub mod wrap;

use formo_core::ElementNode;
use unicode_width::UnicodeWidthChar;

/// Fraction of the font size sitting above the baseline; used whenever text bounds must be
/// approximated from an anchor y.
pub(crate) const ASCENT_FACTOR: f64 = 0.8;

/// Font parameters that influence measured width.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: Option<String>,
    pub size: f64,
    pub weight: Option<String>,
    pub letter_spacing: f64,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: None,
            size: 16.0,
            weight: None,
            letter_spacing: 0.0,
        }
    }
}

impl FontSpec {
    /// Reads font attributes off a text element (typically combined with its first run via
    /// [`FontSpec::merge`]).
    pub fn from_element(node: &ElementNode) -> Self {
        let mut font = FontSpec::default();
        font.merge(
            node.attr("font-family"),
            node.attr_f64("font-size"),
            node.attr("font-weight"),
            node.attr_f64("letter-spacing"),
        );
        font
    }

    pub fn merge(
        &mut self,
        family: Option<&str>,
        size: Option<f64>,
        weight: Option<&str>,
        letter_spacing: Option<f64>,
    ) {
        if let Some(family) = family {
            self.family = Some(family.to_string());
        }
        if let Some(size) = size {
            self.size = size.max(1.0);
        }
        if let Some(weight) = weight {
            self.weight = Some(weight.to_string());
        }
        if let Some(spacing) = letter_spacing {
            self.letter_spacing = spacing;
        }
    }

    pub fn is_bold(&self) -> bool {
        match self.weight.as_deref() {
            Some("bold") | Some("bolder") => true,
            Some(w) => w.parse::<u32>().is_ok_and(|w| w >= 600),
            None => false,
        }
    }
}

/// Measures text width in document units.
///
/// Implementations do not need font-hinting accuracy; wrapping only needs widths that are
/// monotonic in the text and consistent across calls.
pub trait GlyphMetrics {
    fn measure(&self, text: &str, font: &FontSpec) -> f64;
}

/// Width estimator backed by a per-character em table for ASCII and Unicode column widths for
/// everything else. Deterministic and font-file free.
#[derive(Debug, Clone, Default)]
pub struct EmTableGlyphMetrics;

impl EmTableGlyphMetrics {
    fn char_width_em(ch: char) -> f64 {
        if ch == ' ' {
            return 0.33;
        }
        if ch == '\t' {
            return 0.66;
        }
        if ch == '_' || ch == '-' {
            return 0.33;
        }
        if matches!(ch, '.' | ',' | ':' | ';' | '\'' | '`') {
            return 0.28;
        }
        if matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | '/' | '\\' | '|' | '!') {
            return 0.33;
        }
        if matches!(ch, 'i' | 'j' | 'l') {
            return 0.28;
        }
        if matches!(ch, 'f' | 't' | 'r') {
            return 0.37;
        }
        if matches!(ch, 'm' | 'M' | 'W' | 'w') {
            return 0.85;
        }
        if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
            return 0.66;
        }
        if ch.is_ascii() {
            return 0.55;
        }
        // Wide glyphs (CJK and friends) report two columns.
        match ch.width().unwrap_or(1) {
            0 => 0.0,
            1 => 0.6,
            _ => 1.0,
        }
    }
}

impl GlyphMetrics for EmTableGlyphMetrics {
    fn measure(&self, text: &str, font: &FontSpec) -> f64 {
        let em: f64 = text.chars().map(Self::char_width_em).sum();
        let bold_factor = if font.is_bold() { 1.06 } else { 1.0 };
        let glyphs = text.chars().count();
        let spacing = font.letter_spacing * glyphs.saturating_sub(1) as f64;
        em * font.size * bold_factor + spacing
    }
}
