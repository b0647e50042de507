//! The 2-D drawing context the field renders into.
//!
//! [`Surface`] is the immediate-mode subset of a canvas context the engine
//! needs. [`Canvas`] is a software implementation that turns those calls
//! into a display list of filled circles in device pixels.

use crate::color::Rgba;
use glam::{Affine2, Vec2};
use std::f32::consts::TAU;
use tracing::trace;

/// Immediate-mode 2-D drawing context.
pub trait Surface {
    /// Resizes the backing store to `size` device pixels.
    ///
    /// Like a canvas element, resizing erases the contents and resets the
    /// transform to identity.
    fn set_size(&mut self, size: Vec2);

    /// Erases the axis-aligned rectangle `[min, min + size]` in user space.
    fn clear_rect(&mut self, min: Vec2, size: Vec2);

    /// Starts a new, empty path.
    fn begin_path(&mut self);

    /// Adds an arc around `center` from angle `start` to `end` (radians).
    fn arc(&mut self, center: Vec2, radius: f32, start: f32, end: f32);

    /// Sets the color used by [`Surface::fill`].
    fn set_fill(&mut self, color: Rgba);

    /// Fills the current path.
    fn fill(&mut self);

    /// Post-multiplies the transform by a translation.
    fn translate(&mut self, delta: Vec2);

    /// Post-multiplies the transform by a scale.
    fn scale(&mut self, factor: Vec2);

    /// Replaces the transform.
    fn set_transform(&mut self, transform: Affine2);
}

/// A filled circle on the [`Canvas`] display list, in device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawnCircle {
    pub center: Vec2,
    pub radius: f32,
    pub color: Rgba,
}

#[derive(Clone, Copy, Debug)]
struct PathArc {
    center: Vec2,
    radius: f32,
}

/// Software [`Surface`] that records what is visible as circles.
///
/// Only full-circle arcs are kept; partial arcs are dropped when filled.
/// Radii are scaled by the transform's x axis, so non-uniform scales are
/// approximated.
#[derive(Debug)]
pub struct Canvas {
    size: Vec2,
    transform: Affine2,
    fill: Rgba,
    path: Vec<PathArc>,
    circles: Vec<DrawnCircle>,
    calls: usize,
}

impl Canvas {
    /// Creates an empty canvas of `size` device pixels.
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            transform: Affine2::IDENTITY,
            fill: Rgba::default(),
            path: Vec::new(),
            circles: Vec::new(),
            calls: 0,
        }
    }

    /// Backing store size in device pixels.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn transform(&self) -> Affine2 {
        self.transform
    }

    /// What is currently visible, in drawing order.
    pub fn circles(&self) -> &[DrawnCircle] {
        &self.circles
    }

    /// Total number of [`Surface`] calls received.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl Surface for Canvas {
    fn set_size(&mut self, size: Vec2) {
        self.calls += 1;
        self.size = size;
        self.transform = Affine2::IDENTITY;
        self.path.clear();
        self.circles.clear();
    }

    fn clear_rect(&mut self, min: Vec2, size: Vec2) {
        self.calls += 1;
        let a = self.transform.transform_point2(min);
        let b = self.transform.transform_point2(min + size);
        let (lo, hi) = (a.min(b), a.max(b));

        if lo.cmple(Vec2::ZERO).all() && hi.cmpge(self.size).all() {
            self.circles.clear();
        } else {
            self.circles
                .retain(|c| c.center.cmplt(lo).any() || c.center.cmpgt(hi).any());
        }
    }

    fn begin_path(&mut self) {
        self.calls += 1;
        self.path.clear();
    }

    fn arc(&mut self, center: Vec2, radius: f32, start: f32, end: f32) {
        self.calls += 1;
        if (end - start).abs() >= TAU {
            self.path.push(PathArc { center, radius });
        } else {
            trace!(start, end, "partial arc dropped");
        }
    }

    fn set_fill(&mut self, color: Rgba) {
        self.calls += 1;
        self.fill = color;
    }

    fn fill(&mut self) {
        self.calls += 1;
        let scale = self.transform.matrix2.x_axis.length();
        for arc in &self.path {
            self.circles.push(DrawnCircle {
                center: self.transform.transform_point2(arc.center),
                radius: arc.radius * scale,
                color: self.fill,
            });
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.calls += 1;
        self.transform = self.transform * Affine2::from_translation(delta);
    }

    fn scale(&mut self, factor: Vec2) {
        self.calls += 1;
        self.transform = self.transform * Affine2::from_scale(factor);
    }

    fn set_transform(&mut self, transform: Affine2) {
        self.calls += 1;
        self.transform = transform;
    }
}
