use crate::math::{hsl_to_rgb, lerp, project_onto_segment, Point};

/// Straight (non-premultiplied) RGBA color with a floating-point alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba8(0, 0, 0, 0.0);
    pub const BLACK: Color = Color::rgba8(0, 0, 0, 1.0);
    pub const WHITE: Color = Color::rgba8(255, 255, 255, 1.0);

    pub const fn rgba8(r: u8, g: u8, b: u8, a: f64) -> Self {
        Color { r, g, b, a }
    }

    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Color::rgba8(r, g, b, 1.0)
    }

    /// Opaque color from hue (degrees), saturation and lightness (fractions)
    pub fn hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        let (r, g, b) = hsl_to_rgb(hue, saturation, lightness);
        Color::rgb8(r, g, b)
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Color { a, ..self }
    }

    /// Interpolates every channel, alpha included
    pub fn lerp(self, other: Color, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| lerp(a as f64, b as f64, t).round().clamp(0.0, 255.0) as u8;
        Color {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
            a: lerp(self.a, other.a, t),
        }
    }

    /// Source-over composition of `self` on top of `dst`
    pub fn over(self, dst: Color) -> Color {
        let sa = self.a.clamp(0.0, 1.0);
        let da = dst.a.clamp(0.0, 1.0);
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let channel = |s: u8, d: u8| {
            ((s as f64 * sa + d as f64 * da * (1.0 - sa)) / out_a)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Color {
            r: channel(self.r, dst.r),
            g: channel(self.g, dst.g),
            b: channel(self.b, dst.b),
            a: out_a,
        }
    }
}

/// The drawing commands the renderer needs from a 2D surface.
///
/// Coordinates are logical; implementations apply their own scale transform.
pub trait Canvas {
    /// Resets every pixel to transparent
    fn clear(&mut self);
    /// Fills the whole surface with a two-stop gradient along `from -> to`
    fn fill_linear_gradient(&mut self, from: Point, to: Point, start: Color, end: Color);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Color);
    fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Color);
    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color);
}

/// RGBA pixel buffer addressed in physical pixels, drawn into in logical units
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    /// Physical pixels per logical unit
    scale: f64,
    pixel_data: Vec<u8>,
    alpha: Vec<f32>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize, scale: f64) -> Self {
        PixelBuffer {
            width,
            height,
            scale,
            pixel_data: vec![0u8; width * height * 3],
            alpha: vec![0.0; width * height],
        }
    }

    /// Reallocates for a new physical size and reapplies the scale transform
    pub fn resize(&mut self, width: usize, height: usize, scale: f64) {
        if self.width != width || self.height != height {
            *self = PixelBuffer::new(width, height, scale);
        } else {
            self.scale = scale;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[cfg(test)]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        if x >= self.width || y >= self.height {
            return Color::TRANSPARENT;
        }
        let offset = y * self.width + x;
        Color {
            r: self.pixel_data[offset * 3],
            g: self.pixel_data[offset * 3 + 1],
            b: self.pixel_data[offset * 3 + 2],
            a: self.alpha[offset] as f64,
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = y * self.width + x;
        self.pixel_data[offset * 3] = color.r;
        self.pixel_data[offset * 3 + 1] = color.g;
        self.pixel_data[offset * 3 + 2] = color.b;
        self.alpha[offset] = color.a as f32;
    }

    /// Composes `color` over the pixel at `(x, y)`; out-of-range coordinates are ignored
    pub fn blend_pixel(&mut self, x: isize, y: isize, color: Color) {
        if x < 0 || y < 0 || color.a <= 0.0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        let blended = color.over(self.pixel(x, y));
        self.set_pixel(x, y, blended);
    }

    /// Fills every pixel with one color, replacing what was there
    pub fn fill(&mut self, color: Color) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Composes another buffer of the same size on top of this one at the given opacity
    pub fn composite(&mut self, layer: &PixelBuffer, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0);
        for y in 0..self.height.min(layer.height) {
            for x in 0..self.width.min(layer.width) {
                let src = layer.pixel(x, y);
                let src = src.with_alpha(src.a * opacity);
                self.blend_pixel(x as isize, y as isize, src);
            }
        }
    }

    fn to_physical(&self, p: &Point) -> Point {
        [p[0] * self.scale, p[1] * self.scale]
    }
}

impl Canvas for PixelBuffer {
    fn clear(&mut self) {
        self.fill(Color::TRANSPARENT);
    }

    fn fill_linear_gradient(&mut self, from: Point, to: Point, start: Color, end: Color) {
        for y in 0..self.height {
            for x in 0..self.width {
                // Sample at the pixel center, back in logical space
                let p = [
                    (x as f64 + 0.5) / self.scale,
                    (y as f64 + 0.5) / self.scale,
                ];
                let t = project_onto_segment(&p, &from, &to);
                self.blend_pixel(x as isize, y as isize, start.lerp(end, t));
            }
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        let [cx, cy] = self.to_physical(&center);
        let r = radius * self.scale;
        if !(cx.is_finite() && cy.is_finite() && r.is_finite()) || r <= 0.0 {
            return;
        }

        // Sub-pixel dots would vanish under coverage sampling; plot them as one pixel
        if r < 0.5 {
            self.blend_pixel(cx.floor() as isize, cy.floor() as isize, color);
            return;
        }

        let min_x = (cx - r - 1.0).floor() as isize;
        let max_x = (cx + r + 1.0).ceil() as isize;
        let min_y = (cy - r - 1.0).floor() as isize;
        let max_y = (cy + r + 1.0).ceil() as isize;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let coverage = (r + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, color.with_alpha(color.a * coverage));
                }
            }
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Color) {
        let [cx, cy] = self.to_physical(&center);
        let r = radius * self.scale;
        if !(cx.is_finite() && cy.is_finite() && r.is_finite()) || r <= 0.0 {
            return;
        }
        let half = (width * self.scale / 2.0).max(0.5);

        let min_x = (cx - r - half - 1.0).floor() as isize;
        let max_x = (cx + r + half + 1.0).ceil() as isize;
        let min_y = (cy - r - half - 1.0).floor() as isize;
        let max_y = (cy + r + half + 1.0).ceil() as isize;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let from_ring = ((dx * dx + dy * dy).sqrt() - r).abs();
                let coverage = (half + 0.5 - from_ring).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, color.with_alpha(color.a * coverage));
                }
            }
        }
    }

    /// Draws a line using Bresenham's algorithm. Strokes thinner than one
    /// physical pixel render as hairlines.
    fn stroke_line(&mut self, from: Point, to: Point, _width: f64, color: Color) {
        let [x0, y0] = self.to_physical(&from);
        let [x1, y1] = self.to_physical(&to);
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }
        let (mut x0, mut y0, x1, y1) = (
            x0.floor() as isize,
            y0.floor() as isize,
            x1.floor() as isize,
            y1.floor() as isize,
        );
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy; // error value e_xy

        loop {
            self.blend_pixel(x0, y0, color);

            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_transparent_keeps_source() {
        let src = Color::rgba8(10, 20, 30, 0.5);
        assert_eq!(src.over(Color::TRANSPARENT), src);
    }

    #[test]
    fn over_opaque_mixes_channels() {
        let out = Color::rgba8(255, 255, 255, 0.5).over(Color::BLACK);
        assert_eq!((out.r, out.g, out.b), (128, 128, 128));
        assert!((out.a - 1.0).abs() < 1e-9);
    }

    #[test]
    fn circle_is_drawn_in_logical_units() {
        let mut buffer = PixelBuffer::new(20, 20, 0.5);
        buffer.fill_circle([20.0, 20.0], 6.0, Color::WHITE);
        // Logical (20, 20) maps to physical (10, 10)
        assert_eq!(buffer.pixel(10, 10), Color::WHITE);
        assert_eq!(buffer.pixel(0, 0), Color::TRANSPARENT);
        assert_eq!(buffer.pixel(19, 19), Color::TRANSPARENT);
    }

    #[test]
    fn tiny_circle_still_plots_a_pixel() {
        let mut buffer = PixelBuffer::new(8, 8, 0.125);
        buffer.fill_circle([20.0, 20.0], 1.0, Color::WHITE);
        assert_eq!(buffer.pixel(2, 2), Color::WHITE);
    }

    #[test]
    fn non_finite_circle_is_ignored() {
        let mut buffer = PixelBuffer::new(4, 4, 1.0);
        buffer.fill_circle([f64::NAN, 1.0], 2.0, Color::WHITE);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(buffer.pixel(x, y), Color::TRANSPARENT);
            }
        }
    }

    #[test]
    fn gradient_runs_between_stops() {
        let mut buffer = PixelBuffer::new(10, 10, 1.0);
        let start = Color::rgba8(0, 0, 0, 1.0);
        let end = Color::rgba8(200, 100, 50, 1.0);
        buffer.fill_linear_gradient([0.0, 0.0], [10.0, 10.0], start, end);
        let first = buffer.pixel(0, 0);
        let last = buffer.pixel(9, 9);
        assert!(first.r < 20);
        assert!(last.r > 180);
        assert!(buffer.pixel(5, 5).r > first.r && buffer.pixel(5, 5).r < last.r);
    }

    #[test]
    fn line_touches_both_endpoints() {
        let mut buffer = PixelBuffer::new(10, 10, 1.0);
        buffer.stroke_line([1.0, 1.0], [8.0, 5.0], 1.0, Color::WHITE);
        assert_eq!(buffer.pixel(1, 1), Color::WHITE);
        assert_eq!(buffer.pixel(8, 5), Color::WHITE);
        assert_eq!(buffer.pixel(8, 1), Color::TRANSPARENT);
    }

    #[test]
    fn composite_respects_opacity() {
        let mut out = PixelBuffer::new(1, 1, 1.0);
        out.fill(Color::BLACK);
        let mut layer = PixelBuffer::new(1, 1, 1.0);
        layer.fill(Color::WHITE);
        out.composite(&layer, 0.0);
        assert_eq!(out.pixel(0, 0), Color::BLACK);
        out.composite(&layer, 1.0);
        assert_eq!(out.pixel(0, 0), Color::WHITE);
    }

    #[test]
    fn resize_reallocates() {
        let mut buffer = PixelBuffer::new(2, 2, 1.0);
        buffer.fill(Color::WHITE);
        buffer.resize(3, 4, 2.0);
        assert_eq!((buffer.width(), buffer.height()), (3, 4));
        assert_eq!(buffer.scale(), 2.0);
        assert_eq!(buffer.pixel(0, 0), Color::TRANSPARENT);
    }
}
