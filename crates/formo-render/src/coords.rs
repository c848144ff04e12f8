//! Numeric scanning over coordinate-bearing attribute text: `transform` translates and path
//! data. Shared by the cascade engine and the built-in geometry provider.

use regex::Regex;
use std::sync::OnceLock;

const NUM: &str = r"-?(?:\d+\.\d+|\d+\.|\.\d+|\d+)(?:[eE][+-]?\d+)?";

fn re_num() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(NUM).expect("valid regex"))
}

fn re_translate() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| {
        Regex::new(&format!(r"translate\(\s*({NUM})(?:[\s,]+({NUM}))?\s*\)")).expect("valid regex")
    })
}

/// Every numeric token in `s`, in order.
pub fn parse_number_list(s: &str) -> Vec<f64> {
    re_num()
        .find_iter(s)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// The first `translate(tx[, ty])` in a transform attribute. A missing second argument means
/// `ty = 0`, as in SVG.
pub fn parse_translate(transform: &str) -> Option<(f64, f64)> {
    let caps = re_translate().captures(transform)?;
    let tx = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let ty = caps
        .get(2)
        .map_or(Some(0.0), |m| m.as_str().parse::<f64>().ok())?;
    Some((tx, ty))
}

/// Rewrites the first translate in `transform` with its y component shifted by `delta`,
/// normalizing to comma-separated syntax. Returns `None` when no translate is present.
pub fn with_translate_y_shifted(transform: &str, delta: f64) -> Option<String> {
    let (tx, ty) = parse_translate(transform)?;
    Some(
        re_translate()
            .replace(transform, format!("translate({},{})", fmt_number(tx), fmt_number(ty + delta)))
            .into_owned(),
    )
}

/// Appends a fresh translate to an existing transform attribute value (or starts one).
pub fn append_translate(transform: Option<&str>, dx: f64, dy: f64) -> String {
    let translate = format!("translate({},{})", fmt_number(dx), fmt_number(dy));
    match transform {
        Some(existing) if !existing.trim().is_empty() => format!("{existing} {translate}"),
        _ => translate,
    }
}

/// Candidate y-coordinates in path data, read as the second of each numeric pair following the
/// path commands.
///
/// This is a best-effort approximation: curve control points are scanned like endpoints and
/// relative commands are treated like absolute ones. Good enough to decide "does anything in
/// this path sit below the threshold"; not a geometric guarantee.
pub fn path_y_candidates(d: &str) -> Vec<f64> {
    let mut out = Vec::new();
    for segment in split_path_segments(d) {
        let numbers = parse_number_list(segment.args);
        match segment.command.to_ascii_uppercase() {
            'V' => out.extend(numbers),
            'H' | 'Z' => {}
            'A' => {
                // rx ry rot large-arc sweep x y: y is every 7th parameter.
                out.extend(
                    numbers
                        .chunks(7)
                        .filter_map(|c| c.get(6))
                        .copied(),
                );
            }
            _ => {
                out.extend(numbers.chunks(2).filter_map(|c| c.get(1)).copied());
            }
        }
    }
    out
}

/// Coarse bounding box of all coordinate pairs in path data.
pub fn path_pair_bounds(d: &str) -> Option<(f64, f64, f64, f64)> {
    let mut bounds: Option<(f64, f64, f64, f64)> = None;
    for segment in split_path_segments(d) {
        if matches!(segment.command.to_ascii_uppercase(), 'V' | 'H' | 'Z' | 'A') {
            continue;
        }
        for pair in parse_number_list(segment.args).chunks(2) {
            let &[x, y] = pair else { continue };
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                }
            });
        }
    }
    bounds
}

struct PathSegment<'a> {
    command: char,
    args: &'a str,
}

fn split_path_segments(d: &str) -> Vec<PathSegment<'_>> {
    let mut out = Vec::new();
    let mut command = None::<char>;
    let mut start = 0usize;
    for (i, ch) in d.char_indices() {
        if ch.is_ascii_alphabetic() && !matches!(ch, 'e' | 'E') {
            if let Some(cmd) = command {
                out.push(PathSegment {
                    command: cmd,
                    args: &d[start..i],
                });
            }
            command = Some(ch);
            start = i + ch.len_utf8();
        }
    }
    if let Some(cmd) = command {
        out.push(PathSegment {
            command: cmd,
            args: &d[start..],
        });
    }
    out
}

/// Formats a coordinate the way hand-authored SVG does: integral values without a trailing
/// `.0`, everything else as printed by the shortest round-trip formatting.
pub fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
