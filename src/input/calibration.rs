//! Device-to-screen mapping for the touchscreen and swipe thresholds.

use std::io;
use std::path::Path;

use evdevil::event::Abs;
use evdevil::Evdev;

const BASELINE_DENSITY: i32 = 160;

/// Raw extents of one touch axis as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Scale a raw value onto `pixels`. Empty ranges pass the value through.
    fn scale(&self, raw: i32, pixels: i32) -> i32 {
        let span = i64::from(self.max) - i64::from(self.min);
        if span <= 0 {
            return raw;
        }
        (i64::from(raw) * i64::from(pixels) / span) as i32
    }
}

/// Touch axis ranges paired with the framebuffer size they map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchCalibration {
    pub x: AxisRange,
    pub y: AxisRange,
    pub fb_width: i32,
    pub fb_height: i32,
}

impl TouchCalibration {
    pub fn scale_x(&self, raw: i32) -> i32 {
        self.x.scale(raw, self.fb_width)
    }

    pub fn scale_y(&self, raw: i32) -> i32 {
        self.y.scale(raw, self.fb_height)
    }
}

/// Minimum swipe distances in pixels, derived from the panel density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeThresholds {
    pub min_x_px: i32,
    pub min_y_px: i32,
}

impl SwipeThresholds {
    /// Roughly half an inch horizontally and 0.3 inch vertically.
    pub fn from_density(lcd_density: i32) -> Self {
        let density = lcd_density.max(BASELINE_DENSITY);
        let thresholds = Self {
            min_x_px: density * 50 / 100,
            min_y_px: density * 30 / 100,
        };
        log::info!(
            "Swipe thresholds: density={}, min_x={}px, min_y={}px",
            density,
            thresholds.min_x_px,
            thresholds.min_y_px
        );
        thresholds
    }
}

/// Query the multitouch position ranges of an input device.
pub fn probe_touch_axes(path: &Path) -> io::Result<(AxisRange, AxisRange)> {
    let evdev = Evdev::open(path)?;
    let x = evdev.abs_info(Abs::MT_POSITION_X)?;
    let y = evdev.abs_info(Abs::MT_POSITION_Y)?;
    Ok((
        AxisRange::new(x.minimum(), x.maximum()),
        AxisRange::new(y.minimum(), y.maximum()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_to_framebuffer() {
        let cal = TouchCalibration {
            x: AxisRange::new(0, 4096),
            y: AxisRange::new(0, 2048),
            fb_width: 1024,
            fb_height: 1024,
        };
        assert_eq!(cal.scale_x(2048), 512);
        assert_eq!(cal.scale_y(2048), 1024);
    }

    #[test]
    fn test_scale_ignores_min_offset() {
        // scaled = raw * fb / (max - min); the minimum is not subtracted
        let cal = TouchCalibration {
            x: AxisRange::new(100, 1100),
            y: AxisRange::new(0, 1000),
            fb_width: 500,
            fb_height: 500,
        };
        assert_eq!(cal.scale_x(1000), 500);
    }

    #[test]
    fn test_empty_range_passes_through() {
        let cal = TouchCalibration {
            x: AxisRange::new(0, 0),
            y: AxisRange::new(10, 5),
            fb_width: 720,
            fb_height: 1280,
        };
        assert_eq!(cal.scale_x(321), 321);
        assert_eq!(cal.scale_y(42), 42);
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        let cal = TouchCalibration {
            x: AxisRange::new(0, 1 << 20),
            y: AxisRange::new(0, 1 << 20),
            fb_width: 4096,
            fb_height: 4096,
        };
        assert_eq!(cal.scale_x(1 << 20), 4096);
    }

    #[test]
    fn test_thresholds_from_density() {
        assert_eq!(
            SwipeThresholds::from_density(320),
            SwipeThresholds { min_x_px: 160, min_y_px: 96 }
        );
        // densities below the baseline are clamped up
        assert_eq!(
            SwipeThresholds::from_density(120),
            SwipeThresholds { min_x_px: 80, min_y_px: 48 }
        );
    }
}
