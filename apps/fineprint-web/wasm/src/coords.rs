//! Mapping page-local trap geometry onto the scaled viewport.

use fineprint_types::{Rect, Trap};

/// A rectangle in screen pixels at a specific zoom scale.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Map a page-local rect to screen pixels at the given scale.
///
/// Pure and uncached: callers re-evaluate on every scale change.
pub fn scale_rect(rect: &Rect, scale: f64) -> ScreenRect {
    ScreenRect {
        left: rect.x * scale,
        top: rect.y * scale,
        width: rect.w * scale,
        height: rect.h * scale,
    }
}

/// Traps whose `pages` set contains `page`, with their original indices.
///
/// Membership is exact: a trap off this page contributes zero rectangles
/// to its render pass.
pub fn traps_on_page(traps: &[Trap], page: u32) -> Vec<(usize, &Trap)> {
    traps
        .iter()
        .enumerate()
        .filter(|(_, trap)| trap.appears_on(page))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..2000.0
    }

    fn zoom() -> impl Strategy<Value = f64> {
        0.25f64..4.0
    }

    proptest! {
        /// A larger scale strictly grows the mapped area.
        #[test]
        fn area_is_monotone_in_scale(
            x in dimension(), y in dimension(),
            w in dimension(), h in dimension(),
            s1 in zoom(), s2 in zoom(),
        ) {
            prop_assume!(s1 < s2);
            let rect = Rect::new(x, y, w, h);
            prop_assert!(scale_rect(&rect, s2).area() > scale_rect(&rect, s1).area());
        }

        /// Scaling preserves the source aspect ratio.
        #[test]
        fn aspect_ratio_is_preserved(
            w in dimension(), h in dimension(), s in zoom(),
        ) {
            let rect = Rect::new(0.0, 0.0, w, h);
            let mapped = scale_rect(&rect, s);
            prop_assert!((mapped.aspect_ratio() - rect.aspect_ratio()).abs() < 1e-9);
        }

        /// The origin ratio is unchanged: left/top scale by the same factor.
        #[test]
        fn origin_scales_proportionally(
            x in dimension(), y in dimension(), s in zoom(),
        ) {
            let rect = Rect::new(x, y, 10.0, 10.0);
            let mapped = scale_rect(&rect, s);
            prop_assert!((mapped.left / x - s).abs() < 1e-9);
            prop_assert!((mapped.top / y - s).abs() < 1e-9);
        }
    }
}
