// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pixel/meter and degree/radian conversions.
//!
//! View geometry lives in pixel space and everything inside the physics
//! world lives in meter space. [`PixelScale`] is the only bridge between the
//! two and is fixed for the lifetime of a world.

use crate::error::PhysicsError;

/// Pixels-per-meter scale of a physics world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale {
    pixels_per_meter: f32,
}

impl PixelScale {
    /// Create a scale, rejecting zero, negative and non-finite values
    pub fn new(pixels_per_meter: f32) -> Result<Self, PhysicsError> {
        if !pixels_per_meter.is_finite() || pixels_per_meter <= 0.0 {
            return Err(PhysicsError::InvalidPixelsPerMeter(pixels_per_meter));
        }
        Ok(Self { pixels_per_meter })
    }

    /// Number of pixels in one meter
    pub fn pixels_per_meter(&self) -> f32 {
        self.pixels_per_meter
    }

    /// Convert a pixel distance to meters
    pub fn pixels_to_meters(&self, pixels: f32) -> f32 {
        pixels / self.pixels_per_meter
    }

    /// Convert a meter distance to pixels
    pub fn meters_to_pixels(&self, meters: f32) -> f32 {
        meters * self.pixels_per_meter
    }
}

/// Convert radians to degrees
pub fn radians_to_degrees(radians: f32) -> f32 {
    radians.to_degrees()
}

/// Convert degrees to radians
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Wrap an angle in degrees into `[0, 360)`
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate_scale() {
        assert!(matches!(
            PixelScale::new(0.0),
            Err(PhysicsError::InvalidPixelsPerMeter(_))
        ));
        assert!(PixelScale::new(-3.0).is_err());
        assert!(PixelScale::new(f32::NAN).is_err());
        assert!(PixelScale::new(f32::INFINITY).is_err());
        assert!(PixelScale::new(20.0).is_ok());
    }

    #[test]
    fn test_pixel_meter_round_trip() {
        for ppm in [1.0_f32, 20.0, 52.5, 160.0] {
            let scale = PixelScale::new(ppm).unwrap();
            for pixels in [-2048.0_f32, -13.25, 0.0, 0.5, 17.0, 1080.0, 4096.75] {
                let back = scale.meters_to_pixels(scale.pixels_to_meters(pixels));
                let tolerance = pixels.abs().max(1.0) * 1e-5;
                assert!(
                    (back - pixels).abs() <= tolerance,
                    "{pixels} px at {ppm} ppm came back as {back}"
                );
            }
        }
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert!((normalize_degrees(370.0) - 10.0).abs() < 1e-4);
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-4);
        assert!((normalize_degrees(720.0)).abs() < 1e-4);
        let tiny = normalize_degrees(-1e-9);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_angle_conversions() {
        assert!((radians_to_degrees(std::f32::consts::PI) - 180.0).abs() < 1e-4);
        assert!((degrees_to_radians(90.0) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
