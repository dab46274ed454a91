use crate::graphics::PixelBuffer;
use std::time::Duration;

/// Logical widths below this are treated as a mobile form factor
pub const MOBILE_BREAKPOINT: f64 = 768.0;

/// Viewport size in logical units plus the device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Viewport {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Scale from logical to physical pixels; an unusable ratio counts as 1
    pub fn scale(&self) -> f64 {
        if self.device_pixel_ratio > 0.0 && self.device_pixel_ratio.is_finite() {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }

    /// Drawing-surface size in physical pixels
    pub fn physical_size(&self) -> (usize, usize) {
        let dpr = self.scale();
        // Tolerate float noise so that e.g. 1024 * (1/8) is exactly 128
        let scaled = |v: f64| ((v * dpr) - 1e-6).ceil().max(0.0) as usize;
        (scaled(self.width), scaled(self.height))
    }

    pub fn device_class(&self) -> DeviceClass {
        DeviceClass::from_width(self.width)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Coarse form-factor class that sizes the particle budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    pub fn from_width(width: f64) -> Self {
        if width < MOBILE_BREAKPOINT {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn particle_count(self) -> usize {
        match self {
            DeviceClass::Mobile => 30,
            DeviceClass::Desktop => 80,
        }
    }

    /// Pairs closer than this are joined by a connecting line
    pub fn connection_distance(self) -> f64 {
        match self {
            DeviceClass::Mobile => 80.0,
            DeviceClass::Desktop => 120.0,
        }
    }

    /// Minimum delay between frames, `None` meaning every display refresh
    pub fn frame_interval(self, mobile_fps: u32) -> Option<Duration> {
        match self {
            DeviceClass::Mobile => Some(Duration::from_secs_f64(1.0 / mobile_fps.max(1) as f64)),
            DeviceClass::Desktop => None,
        }
    }
}

/// The drawing surface: a pixel buffer kept in step with the viewport
#[derive(Debug, Clone)]
pub struct Surface {
    buffer: PixelBuffer,
}

impl Surface {
    pub fn new(viewport: Viewport) -> Self {
        let (width, height) = viewport.physical_size();
        Surface {
            buffer: PixelBuffer::new(width, height, viewport.scale()),
        }
    }

    /// Resizes the backing buffer and reapplies the DPR scale transform
    pub fn resize(&mut self, viewport: Viewport) {
        let (width, height) = viewport.physical_size();
        self.buffer.resize(width, height, viewport.scale());
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_size_follows_dpr() {
        assert_eq!(Viewport::new(1024.0, 768.0, 2.0).physical_size(), (2048, 1536));
        assert_eq!(Viewport::new(1024.0, 768.0, 0.125).physical_size(), (128, 96));
        assert_eq!(Viewport::new(100.5, 10.0, 1.0).physical_size(), (101, 10));
    }

    #[test]
    fn invalid_dpr_falls_back_to_one() {
        assert_eq!(Viewport::new(10.0, 20.0, 0.0).physical_size(), (10, 20));
        assert_eq!(Viewport::new(10.0, 20.0, f64::NAN).physical_size(), (10, 20));
    }

    #[test]
    fn device_class_breakpoint() {
        assert_eq!(DeviceClass::from_width(767.9), DeviceClass::Mobile);
        assert_eq!(DeviceClass::from_width(768.0), DeviceClass::Desktop);
        assert_eq!(Viewport::new(1024.0, 768.0, 1.0).device_class().particle_count(), 80);
        assert_eq!(Viewport::new(375.0, 667.0, 1.0).device_class().particle_count(), 30);
    }

    #[test]
    fn mobile_frames_are_throttled() {
        assert_eq!(DeviceClass::Desktop.frame_interval(30), None);
        let interval = DeviceClass::Mobile.frame_interval(30).unwrap();
        assert!((interval.as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn surface_resize_rescales() {
        let mut surface = Surface::new(Viewport::new(100.0, 50.0, 1.0));
        assert_eq!((surface.buffer().width(), surface.buffer().height()), (100, 50));
        surface.resize(Viewport::new(100.0, 50.0, 2.0));
        assert_eq!((surface.buffer().width(), surface.buffer().height()), (200, 100));
        assert_eq!(surface.buffer().scale(), 2.0);
    }
}
