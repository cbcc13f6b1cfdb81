//! Custom assertions for anonymization testing.

use paper_anonymizer::document::Rect;
use paper_anonymizer::ExcludedRegions;

use super::fake::Stamp;

/// Asserts that no overlay was drawn over a protected region of its page.
///
/// # Panics
/// Panics with the offending stamp and region.
pub fn assert_no_stamp_in_protected_region(stamps: &[Stamp], regions: &ExcludedRegions) {
    for stamp in stamps {
        for region in regions.page(stamp.page) {
            assert!(
                !region.rect.intersects(&stamp.rect),
                "stamp {:?} on page {} overlaps protected section '{}' at {:?}",
                stamp.text,
                stamp.page + 1,
                region.title,
                region.rect
            );
        }
    }
}

/// Asserts that `text` still contains `pattern`.
pub fn assert_preserved(text: &str, pattern: &str) {
    assert!(
        text.contains(pattern),
        "'{}' should be preserved but was not found in:\n{}",
        pattern,
        text
    );
}

/// Asserts that `text` no longer contains `pattern`.
pub fn assert_redacted(text: &str, pattern: &str) {
    assert!(
        !text.contains(pattern),
        "'{}' should be redacted but was found in:\n{}",
        pattern,
        text
    );
}

/// Asserts that two rectangles are equal within a small tolerance.
pub fn assert_rect_close(actual: &Rect, expected: &Rect) {
    let close = |a: f32, b: f32| (a - b).abs() < 0.01;
    assert!(
        close(actual.x0, expected.x0)
            && close(actual.y0, expected.y0)
            && close(actual.x1, expected.x1)
            && close(actual.y1, expected.y1),
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}
