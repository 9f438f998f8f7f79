/// Gap kept between a repositioned popup and the viewport edge.
pub const VIEWPORT_MARGIN: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset_by(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

/// Shift a page-space box left/up so it stays inside the visible viewport.
///
/// Only overflowing axes move. The result never goes above or left of the
/// current scroll offset, so the popup stays reachable even when it is larger
/// than the viewport.
pub fn fit_within_viewport(position: Point, size: Size, viewport: Size, scroll: Point) -> Point {
    let mut fitted = position;

    let right_limit = viewport.width + scroll.x;
    if position.x + size.width > right_limit {
        fitted.x = (right_limit - size.width - VIEWPORT_MARGIN).max(scroll.x);
    }

    let bottom_limit = viewport.height + scroll.y;
    if position.y + size.height > bottom_limit {
        fitted.y = (bottom_limit - size.height - VIEWPORT_MARGIN).max(scroll.y);
    }

    fitted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_overflowing_right_edge_moves_left() {
        let fitted = fit_within_viewport(
            Point::new(800, 20),
            Size::new(220, 150),
            Size::new(1000, 800),
            Point::default(),
        );
        assert_eq!(fitted, Point::new(770, 20));
    }

    #[test]
    fn popup_overflowing_bottom_edge_moves_up() {
        let fitted = fit_within_viewport(
            Point::new(100, 700),
            Size::new(220, 150),
            Size::new(1000, 800),
            Point::default(),
        );
        assert_eq!(fitted, Point::new(100, 640));
    }

    #[test]
    fn scroll_offset_is_respected() {
        let fitted = fit_within_viewport(
            Point::new(900, 1300),
            Size::new(220, 150),
            Size::new(1000, 800),
            Point::new(0, 600),
        );
        assert_eq!(fitted, Point::new(770, 1240));
    }

    #[test]
    fn oversized_popup_is_clamped_to_scroll_origin() {
        let fitted = fit_within_viewport(
            Point::new(50, 50),
            Size::new(1500, 900),
            Size::new(1000, 800),
            Point::new(0, 200),
        );
        assert_eq!(fitted, Point::new(0, 200));
    }

    #[test]
    fn fitting_popup_is_left_alone() {
        let origin = Point::new(10, 10);
        let fitted = fit_within_viewport(origin, Size::new(50, 50), Size::default(), Point::default());
        assert_eq!(fitted, origin);
    }
}
