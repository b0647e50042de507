use glam::Vec2;

/// Geometry of the element the field is drawn into, as reported by the host.
///
/// `size` is measured in logical pixels; the drawing surface itself is
/// `size * device_pixel_ratio` device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Container size in logical pixels.
    pub size: Vec2,
    /// Top-left corner of the container in page coordinates.
    pub origin: Vec2,
    /// Device pixels per logical pixel.
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(size: Vec2, origin: Vec2, device_pixel_ratio: f32) -> Self {
        Self {
            size,
            origin,
            device_pixel_ratio,
        }
    }

    /// A viewport at the page origin with a device pixel ratio of 1.
    pub fn with_size(size: Vec2) -> Self {
        Self::new(size, Vec2::ZERO, 1.0)
    }

    /// Size of the backing surface in device pixels.
    pub fn device_size(&self) -> Vec2 {
        self.size * self.device_pixel_ratio
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::with_size(Vec2::ZERO)
    }
}
