// src/geometry.rs
use nalgebra::Point2;

/// Pixel-space point. Coordinates are whole pixels stored as f32 so the
/// distance math stays in one type.
pub type PixelPoint = Point2<f32>;

/// Euclidean distance between two pixel points.
pub fn distance(a: &PixelPoint, b: &PixelPoint) -> f32 {
    nalgebra::distance(a, b)
}

/// Scales a normalized detector coordinate into frame pixels, truncating
/// toward zero like an integer cast.
pub fn to_pixel(x_norm: f32, y_norm: f32, width: u32, height: u32) -> PixelPoint {
    let x = (x_norm * width as f32).trunc();
    let y = (y_norm * height as f32).trunc();
    PixelPoint::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = PixelPoint::new(123.0, 45.0);
        assert_eq!(distance(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let p = PixelPoint::new(10.0, 200.0);
        let q = PixelPoint::new(310.0, 17.0);
        assert_eq!(distance(&p, &q), distance(&q, &p));
    }

    #[test]
    fn test_three_four_five() {
        let p = PixelPoint::new(0.0, 0.0);
        let q = PixelPoint::new(3.0, 4.0);
        assert!((distance(&p, &q) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_pixel_truncates() {
        let p = to_pixel(0.5, 0.25, 640, 480);
        assert_eq!(p, PixelPoint::new(320.0, 120.0));

        let p = to_pixel(0.0999, 0.9999, 640, 480);
        assert_eq!(p, PixelPoint::new(63.0, 479.0));
    }
}
