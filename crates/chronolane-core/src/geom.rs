#![forbid(unsafe_code)]

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

/// Rounds `v` to the nearest multiple of `cell`. Non-positive or non-finite cells leave `v` as is.
pub fn snap(v: f64, cell: f64) -> f64 {
    if !(cell.is_finite() && cell > 0.0) {
        return v;
    }
    (v / cell).round() * cell
}
