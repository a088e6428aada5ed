use super::Vec2;

/// Axis-aligned rectangle in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.origin.x && p.y >= self.origin.y && p.x < max.x && p.y < max.y
    }

    /// Shrinks the rectangle by `d` on every side. Never produces a negative size.
    #[inline]
    pub fn inset(self, d: f32) -> Rect {
        Rect::new(
            self.origin.x + d,
            self.origin.y + d,
            (self.size.x - 2.0 * d).max(0.0),
            (self.size.y - 2.0 * d).max(0.0),
        )
    }

    /// Splits horizontally into `n` equal columns separated by `gap`.
    pub fn columns(self, n: usize, gap: f32) -> impl Iterator<Item = Rect> {
        let n = n.max(1);
        let w = ((self.size.x - gap * (n - 1) as f32) / n as f32).max(0.0);
        (0..n).map(move |i| {
            Rect::new(self.origin.x + i as f32 * (w + gap), self.origin.y, w, self.size.y)
        })
    }

    /// Fraction of the width at which `x` lies, clamped to `[0, 1]`.
    #[inline]
    pub fn fraction_x(self, x: f32) -> f32 {
        if self.size.x <= 0.0 {
            return 0.0;
        }
        ((x - self.origin.x) / self.size.x).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_interior_point() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn contains_max_edge_exclusive() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(0.0, 0.0)));
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(10.0, 10.0)));
    }

    // ── layout helpers ────────────────────────────────────────────────────

    #[test]
    fn inset_never_goes_negative() {
        let i = r(0.0, 0.0, 4.0, 20.0).inset(3.0);
        assert_eq!(i, r(3.0, 3.0, 0.0, 14.0));
        assert!(i.is_empty());
    }

    #[test]
    fn columns_cover_width_with_gaps() {
        let cols: Vec<_> = r(10.0, 0.0, 100.0, 8.0).columns(2, 4.0).collect();
        assert_eq!(cols, vec![r(10.0, 0.0, 48.0, 8.0), r(62.0, 0.0, 48.0, 8.0)]);
    }

    #[test]
    fn fraction_x_clamps_outside_points() {
        let track = r(100.0, 0.0, 200.0, 10.0);
        assert_eq!(track.fraction_x(50.0), 0.0);
        assert_eq!(track.fraction_x(200.0), 0.5);
        assert_eq!(track.fraction_x(1000.0), 1.0);
    }
}
