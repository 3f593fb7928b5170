//! Pulls a `[x1, y1, x2, y2]` box out of free-form model text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// The exact syntax the diagnosis prompt asks the model for.
static BOX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d+), (\d+), (\d+), (\d+)\]").unwrap());

/// Same four integers with any spacing; only used to tell "malformed" from "absent".
static LOOSE_BOX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*\d+\s*,\s*\d+\s*,\s*\d+\s*,\s*\d+\s*\]").unwrap());

static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d$").unwrap());

/// Corner coordinates in image pixels, exactly as the model wrote them.
///
/// No ordering or bounds guarantee: `x1 > x2` and off-image values are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn as_tuple(&self) -> (i32, i32, i32, i32) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxExtraction {
    Found(BoundingBox),
    NotFound,
    /// Something box-shaped was there but could not be used.
    Malformed(String),
}

impl BoxExtraction {
    pub fn found(&self) -> Option<BoundingBox> {
        match self {
            Self::Found(bbox) => Some(*bbox),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::NotFound => "not_found",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// Returns the first strict `[x1, y1, x2, y2]` match, left to right.
pub fn extract_bounding_box(text: &str) -> BoxExtraction {
    let Some(caps) = BOX_PATTERN.captures(text) else {
        return match LOOSE_BOX_PATTERN.find(text) {
            Some(m) => BoxExtraction::Malformed(format!(
                "coordinates {} are not in the expected [x1, y1, x2, y2] form",
                m.as_str()
            )),
            None => BoxExtraction::NotFound,
        };
    };

    let mut coords = [0i32; 4];
    for (slot, idx) in coords.iter_mut().zip(1..=4) {
        let raw = &caps[idx];
        match parse_coordinate(raw) {
            Some(v) => *slot = v,
            None => {
                return BoxExtraction::Malformed(format!("coordinate {} is out of range", raw));
            }
        }
    }

    let [x1, y1, x2, y2] = coords;
    BoxExtraction::Found(BoundingBox::new(x1, y1, x2, y2))
}

/// Parses a run of decimal digits from any script (`１０`, `١٠`, `10`).
///
/// `None` only when the value does not fit in `i32`.
fn parse_coordinate(raw: &str) -> Option<i32> {
    raw.chars().try_fold(0i32, |acc, c| {
        acc.checked_mul(10)?.checked_add(digit_value(c)? as i32)
    })
}

// Unicode lays every decimal digit set out as ten consecutive code points
// starting at zero, so a digit's value is its distance from the start of its
// run, modulo ten for back-to-back sets.
fn digit_value(c: char) -> Option<u32> {
    if let Some(d) = c.to_digit(10) {
        return Some(d);
    }
    if !is_decimal_digit(c) {
        return None;
    }

    let mut offset = 0;
    let mut code = c as u32;
    while let Some(prev) = code.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        offset += 1;
        code -= 1;
    }
    Some(offset % 10)
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DIGIT.is_match(c.encode_utf8(&mut buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_embedded_box() {
        let text = "Leaf rust detected; the area [10, 20, 150, 180] is affected.";
        assert_eq!(
            extract_bounding_box(text).found().map(|b| b.as_tuple()),
            Some((10, 20, 150, 180))
        );
    }

    #[test]
    fn test_first_match_wins() {
        let text = "Primary lesion [5, 6, 7, 8], secondary [100, 200, 300, 400].";
        assert_eq!(
            extract_bounding_box(text),
            BoxExtraction::Found(BoundingBox::new(5, 6, 7, 8))
        );
    }

    #[test]
    fn test_keeps_inverted_and_degenerate_boxes() {
        assert_eq!(
            extract_bounding_box("[300, 200, 10, 5]").found(),
            Some(BoundingBox::new(300, 200, 10, 5))
        );
        assert_eq!(
            extract_bounding_box("[0, 0, 0, 0]").found(),
            Some(BoundingBox::new(0, 0, 0, 0))
        );
    }

    #[test]
    fn test_no_box() {
        assert_eq!(extract_bounding_box("No disease detected."), BoxExtraction::NotFound);
        assert_eq!(extract_bounding_box(""), BoxExtraction::NotFound);
        // three numbers and negatives never match
        assert_eq!(extract_bounding_box("[1, 2, 3]"), BoxExtraction::NotFound);
        assert_eq!(extract_bounding_box("[-1, 2, 3, 4]"), BoxExtraction::NotFound);
    }

    #[test]
    fn test_off_syntax_box_is_malformed() {
        let result = extract_bounding_box("Affected region: [10,20,30,40]");
        assert_eq!(result.status(), "malformed");
        assert!(result.found().is_none());
    }

    #[test]
    fn test_overflowing_coordinate_is_malformed() {
        let result = extract_bounding_box("[1, 2, 99999999999, 4]");
        match result {
            BoxExtraction::Malformed(reason) => assert!(reason.contains("99999999999")),
            other => panic!("expected malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_non_ascii_digits_are_parsed() {
        assert_eq!(
            extract_bounding_box("病斑区域 [１０, ２０, ３０, ４０]").found(),
            Some(BoundingBox::new(10, 20, 30, 40))
        );
        assert_eq!(
            extract_bounding_box("area [١٠, ٢٠, ٣٠, ٤٠] then [1, 2, 3, 4]").found(),
            Some(BoundingBox::new(10, 20, 30, 40))
        );
        // Devanagari and mixed scripts
        assert_eq!(
            extract_bounding_box("[५, 6, ७८, ९]").found(),
            Some(BoundingBox::new(5, 6, 78, 9))
        );
    }

    #[test]
    fn test_digit_values_across_adjacent_sets() {
        // mathematical bold digits are followed directly by double-struck ones
        assert_eq!(digit_value('\u{1D7CE}'), Some(0));
        assert_eq!(digit_value('\u{1D7D7}'), Some(9));
        assert_eq!(digit_value('\u{1D7D8}'), Some(0));
        assert_eq!(digit_value('\u{1D7DB}'), Some(3));
        assert_eq!(digit_value('x'), None);
        assert_eq!(parse_coordinate("２１４７４８３６４８"), None);
        assert_eq!(parse_coordinate("２１４７４８３６４７"), Some(i32::MAX));
    }

    #[test]
    fn test_display_matches_prompt_syntax() {
        assert_eq!(BoundingBox::new(1, 2, 3, 4).to_string(), "[1, 2, 3, 4]");
    }
}
