//! Greedy line breaking under a width constraint.

use super::{FontSpec, GlyphMetrics};

/// Breaks `text` into lines no wider than `max_width`.
///
/// Explicit `\n` breaks are honored first; each sub-line is then word-wrapped greedily. A single
/// word wider than the constraint is still placed alone (no mid-word breaking). Empty sub-lines
/// from consecutive breaks are preserved, so `n` breaks always produce at least `n + 1` lines.
pub fn break_text_into_lines(
    text: &str,
    max_width: f64,
    font: &FontSpec,
    metrics: &dyn GlyphMetrics,
) -> Vec<String> {
    let mut lines = Vec::new();
    for sub_line in text.split('\n') {
        if !max_width.is_finite() || max_width <= 0.0 {
            lines.push(sub_line.to_string());
            continue;
        }
        wrap_line(sub_line, max_width, font, metrics, &mut lines);
    }
    lines
}

fn wrap_line(
    line: &str,
    max_width: f64,
    font: &FontSpec,
    metrics: &dyn GlyphMetrics,
    out: &mut Vec<String>,
) {
    let words: Vec<&str> = line.split(' ').filter(|w| !w.is_empty()).collect();
    if words.is_empty() {
        out.push(String::new());
        return;
    }

    let mut current = String::new();
    for word in words {
        if current.is_empty() {
            // A word that does not fit on its own still occupies a line of its own.
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if metrics.measure(&candidate, font) <= max_width {
            current = candidate;
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::EmTableGlyphMetrics;

    fn lines(text: &str, max_width: f64) -> Vec<String> {
        break_text_into_lines(text, max_width, &FontSpec::default(), &EmTableGlyphMetrics)
    }

    #[test]
    fn explicit_breaks_pass_through_when_lines_fit() {
        assert_eq!(
            lines("First line\nSecond line", 400.0),
            vec!["First line".to_string(), "Second line".to_string()]
        );
    }

    #[test]
    fn consecutive_breaks_preserve_empty_lines() {
        assert_eq!(lines("\n\n\n", 100.0), vec![""; 4]);
        assert_eq!(lines("a\n\nb", 100.0), vec!["a", "", "b"]);
    }

    #[test]
    fn greedy_wrap_keeps_lines_within_the_constraint() {
        let metrics = EmTableGlyphMetrics;
        let font = FontSpec::default();
        let max_width = 80.0;
        let wrapped =
            break_text_into_lines("the quick brown fox jumps over the lazy dog", max_width, &font, &metrics);
        assert!(wrapped.len() > 1);
        for line in &wrapped {
            assert!(metrics.measure(line, &font) <= max_width, "line too wide: {line:?}");
        }
        assert_eq!(
            wrapped.join(" "),
            "the quick brown fox jumps over the lazy dog"
        );
    }

    #[test]
    fn oversized_word_is_placed_alone() {
        let metrics = EmTableGlyphMetrics;
        let font = FontSpec::default();
        let wrapped = break_text_into_lines("hi incomprehensibilities yo", 40.0, &font, &metrics);
        assert_eq!(wrapped, vec!["hi", "incomprehensibilities", "yo"]);
        assert!(metrics.measure(&wrapped[1], &font) > 40.0);
    }

    #[test]
    fn unconstrained_width_disables_wrapping() {
        assert_eq!(lines("a b c", f64::INFINITY), vec!["a b c"]);
        assert_eq!(lines("a b c", 0.0), vec!["a b c"]);
    }
}
