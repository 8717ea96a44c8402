use core::ops::Sub;

/// Pixel-centre coordinates: integer values land on pixel centres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_idx(idx: (usize, usize)) -> Self {
        Self {
            x: idx.0 as f32,
            y: idx.1 as f32,
        }
    }

    pub fn distance(self, other: Point2f) -> f32 {
        (self - other).norm()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Vec2f {
    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }
}

impl Sub<Point2f> for Point2f {
    type Output = Vec2f;

    fn sub(self, rhs: Point2f) -> Self::Output {
        Vec2f {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Sum of consecutive Euclidean distances; `closed` adds the last-to-first link.
pub fn arc_length(points: &[Point2f], closed: bool) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }

    let mut len = 0.0_f32;
    for pair in points.windows(2) {
        len += pair[0].distance(pair[1]);
    }

    if closed {
        len += points[points.len() - 1].distance(points[0]);
    }

    len
}

#[cfg(test)]
mod tests {
    use super::{Point2f, Vec2f, arc_length};

    #[test]
    fn vec_ops() {
        let a = Vec2f { x: 3.0, y: 4.0 };
        assert!((a.norm() - 5.0).abs() < 1e-6);
        assert_eq!(a.dot(Vec2f { x: 1.0, y: -1.0 }), -1.0);

        let p = Point2f::new(2.0, 3.0);
        assert_eq!(p - Point2f::new(1.0, 1.0), Vec2f { x: 1.0, y: 2.0 });
        assert_eq!(p.distance(Point2f::new(5.0, 7.0)), 5.0);
    }

    #[test]
    fn arc_length_open_and_closed() {
        let square = [
            Point2f::from_idx((0, 0)),
            Point2f::from_idx((1, 0)),
            Point2f::from_idx((1, 1)),
            Point2f::from_idx((0, 1)),
        ];
        assert!((arc_length(&square, false) - 3.0).abs() < 1e-6);
        assert!((arc_length(&square, true) - 4.0).abs() < 1e-6);

        let diagonal = [Point2f::from_idx((0, 0)), Point2f::from_idx((1, 1))];
        assert!((arc_length(&diagonal, false) - 2.0_f32.sqrt()).abs() < 1e-6);
        assert_eq!(arc_length(&diagonal[..1], true), 0.0);
    }
}
