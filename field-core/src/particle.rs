use glam::Vec2;
use rand::Rng;

/// One circle of the particle field.
///
/// The logical position (`pos`) and the pointer-driven render offset
/// (`offset`) are kept apart: edge fading looks at where the particle is
/// drawn, while the escape test that triggers respawning only looks at `pos`.
///
/// `radius`, `target_alpha` and `magnetism` are sampled once in
/// [`Particle::spawn`] and never change afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// True position in canvas (logical pixel) space.
    pub pos: Vec2,
    /// Per-particle velocity, applied every frame.
    pub drift: Vec2,
    /// Pointer attraction displacement, applied only when drawing.
    pub offset: Vec2,
    pub(crate) alpha: f32,
    radius: f32,
    target_alpha: f32,
    magnetism: f32,
}

impl Particle {
    /// Creates a resting, fully transparent particle.
    ///
    /// ### Parameters
    /// - `pos` - True position in canvas space.
    /// - `radius` - Circle radius.
    /// - `target_alpha` - Opacity the particle fades in to.
    /// - `magnetism` - Pointer attraction multiplier.
    pub fn new(pos: Vec2, radius: f32, target_alpha: f32, magnetism: f32) -> Self {
        Self {
            pos,
            drift: Vec2::ZERO,
            offset: Vec2::ZERO,
            alpha: 0.0,
            radius,
            target_alpha,
            magnetism,
        }
    }

    /// Samples a fresh particle somewhere inside `bounds`.
    ///
    /// - Position: each axis is `floor(u * extent)`, so `[0, extent)`.
    /// - Radius: `floor(u * 2) + base_size`, i.e. `base_size` or `base_size + 1`.
    /// - Target opacity: `u * 0.6 + 0.1` rounded to one decimal, in `[0.1, 0.7]`.
    /// - Drift: each axis `(u - 0.5) * 0.1`.
    /// - Magnetism: `0.1 + u * 4`.
    ///
    /// The particle starts with zero opacity and zero render offset.
    ///
    /// ### Parameters
    /// - `bounds` - Canvas size in logical pixels.
    /// - `base_size` - Configured base radius.
    /// - `rng` - Random source; a seeded one makes the sample reproducible.
    pub fn spawn(bounds: Vec2, base_size: f32, rng: &mut impl Rng) -> Self {
        // Sampled in f64 so the product cannot round up to the extent itself.
        let x = (rng.random::<f64>() * f64::from(bounds.x)).floor() as f32;
        let y = (rng.random::<f64>() * f64::from(bounds.y)).floor() as f32;
        let radius = (rng.random::<f32>() * 2.0).floor() + base_size;
        let target_alpha = ((rng.random::<f32>() * 0.6 + 0.1) * 10.0).round() / 10.0;
        let dx = (rng.random::<f32>() - 0.5) * 0.1;
        let dy = (rng.random::<f32>() - 0.5) * 0.1;
        let magnetism = 0.1 + rng.random::<f32>() * 4.0;

        Self {
            drift: Vec2::new(dx, dy),
            ..Self::new(Vec2::new(x, y), radius, target_alpha, magnetism)
        }
    }

    /// Sets the per-particle velocity.
    pub fn with_drift(mut self, drift: Vec2) -> Self {
        self.drift = drift;
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn target_alpha(&self) -> f32 {
        self.target_alpha
    }

    pub fn magnetism(&self) -> f32 {
        self.magnetism
    }

    /// Where the particle is drawn: true position plus render offset.
    #[inline]
    pub fn rendered_pos(&self) -> Vec2 {
        self.pos + self.offset
    }

    /// Distance from the drawn circle's rim to the nearest canvas edge.
    ///
    /// Negative when the circle overlaps or crosses an edge.
    ///
    /// ### Parameters
    /// - `bounds` - Canvas size in logical pixels.
    pub fn edge_distance(&self, bounds: Vec2) -> f32 {
        let p = self.rendered_pos();
        let r = self.radius;
        [p.x - r, bounds.x - p.x - r, p.y - r, bounds.y - p.y - r]
            .into_iter()
            .fold(f32::INFINITY, f32::min)
    }

    /// Returns `true` once the true position has left the canvas by more
    /// than the particle's own radius on either axis.
    pub fn escaped(&self, bounds: Vec2) -> bool {
        let r = self.radius;
        self.pos.x < -r
            || self.pos.x > bounds.x + r
            || self.pos.y < -r
            || self.pos.y > bounds.y + r
    }
}
