/// A point or vector in logical (unscaled) surface coordinates
pub type Point = [f64; 2];

/// Component-wise difference `a - b`
pub fn sub(a: &Point, b: &Point) -> Point {
    [a[0] - b[0], a[1] - b[1]]
}

/// Euclidean length of a vector
pub fn length(v: &Point) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

/// Euclidean distance between two points
pub fn distance(a: &Point, b: &Point) -> f64 {
    length(&sub(a, b))
}

/// Normalizes a vector, returning `None` for zero-length or non-finite input
pub fn normalize(v: &Point) -> Option<Point> {
    let len = length(v);
    if len <= f64::EPSILON || !len.is_finite() {
        return None;
    }
    Some([v[0] / len, v[1] / len])
}

/// Linear interpolation between `a` and `b`
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Projects `p` onto the segment `from -> to`, returning the clamped parameter in `[0, 1]`
pub fn project_onto_segment(p: &Point, from: &Point, to: &Point) -> f64 {
    let axis = sub(to, from);
    let len2 = axis[0] * axis[0] + axis[1] * axis[1];
    if len2 <= f64::EPSILON {
        return 0.0;
    }
    let rel = sub(p, from);
    ((rel[0] * axis[0] + rel[1] * axis[1]) / len2).clamp(0.0, 1.0)
}

/// Converts HSL (hue in degrees, saturation and lightness in `[0, 1]`) to 8-bit RGB
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    let h = hue.rem_euclid(360.0) / 60.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = l - chroma / 2.0;
    let to_u8 = |c: f64| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rejects_zero_vector() {
        assert_eq!(normalize(&[0.0, 0.0]), None);
        assert_eq!(normalize(&[f64::NAN, 1.0]), None);
        let n = normalize(&[3.0, 4.0]).unwrap();
        assert!((n[0] - 0.6).abs() < 1e-12);
        assert!((n[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
        assert_eq!(hsl_to_rgb(360.0, 0.0, 1.0), (255, 255, 255));
    }

    #[test]
    fn projection_is_clamped() {
        let from = [0.0, 0.0];
        let to = [10.0, 10.0];
        assert_eq!(project_onto_segment(&[-5.0, -5.0], &from, &to), 0.0);
        assert_eq!(project_onto_segment(&[20.0, 20.0], &from, &to), 1.0);
        assert!((project_onto_segment(&[5.0, 5.0], &from, &to) - 0.5).abs() < 1e-12);
    }
}
