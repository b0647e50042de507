//! Per-frame update steps for a single particle.
//!
//! Every animation frame the engine runs, for each particle in order:
//! 1. [`edge_fade`] — opacity follows the distance to the nearest edge,
//!    measured at the drawn (offset) position.
//! 2. [`drift`] — the true position advances by the particle's own velocity
//!    plus the field-wide bias.
//! 3. [`attract`] — the render offset eases toward the pointer.
//!
//! Escape testing and respawning happen in [`crate::engine`], after the
//! particle has been drawn.

use crate::particle::Particle;
use glam::Vec2;

/// Distance from an edge, in logical pixels, over which particles fade out.
pub const FADE_DISTANCE: f32 = 20.0;

/// Opacity gained per frame by a particle well inside the canvas.
pub const ALPHA_STEP: f32 = 0.02;

/// Linearly maps `value` from `[start1, end1]` onto `[start2, end2]`.
///
/// Results below zero are clamped to zero; results above `end2` are not
/// clamped, which is how callers tell "well inside" from "at the limit".
///
/// ### Parameters
/// - `value` - Input value.
/// - `start1`, `end1` - Source range (`start1 != end1`).
/// - `start2`, `end2` - Target range.
pub fn remap_clamped(value: f32, start1: f32, end1: f32, start2: f32, end2: f32) -> f32 {
    let remapped = (value - start1) * (end2 - start2) / (end1 - start1) + start2;
    remapped.max(0.0)
}

/// Opacity multiplier for a particle whose rim is `distance` from the
/// nearest edge, rounded to two decimal places.
///
/// `0` at (or beyond) an edge, `1` at [`FADE_DISTANCE`], above `1` further in.
#[inline]
pub fn edge_multiplier(distance: f32) -> f32 {
    let m = remap_clamped(distance, 0.0, FADE_DISTANCE, 0.0, 1.0);
    (m * 100.0).round() / 100.0
}

/// Updates the particle's opacity from its distance to the canvas edges.
///
/// Well inside the canvas (multiplier above `1`) the opacity climbs by
/// [`ALPHA_STEP`] per frame up to the particle's target. Near an edge it is
/// set to `target * multiplier`, so fading out never jumps.
///
/// Either way the opacity stays within `[0, target_alpha]`.
///
/// ### Parameters
/// - `p` - Particle to update.
/// - `bounds` - Canvas size in logical pixels.
pub fn edge_fade(p: &mut Particle, bounds: Vec2) {
    let m = edge_multiplier(p.edge_distance(bounds));
    if m > 1.0 {
        p.alpha = (p.alpha + ALPHA_STEP).min(p.target_alpha());
    } else {
        p.alpha = p.target_alpha() * m;
    }
}

/// Advances the true position by the particle's drift plus the field bias.
#[inline]
pub fn drift(p: &mut Particle, bias: Vec2) {
    p.pos += p.drift + bias;
}

/// Eases the render offset toward the pointer.
///
/// The offset moves a `1 / ease` fraction of the way toward
/// `pointer / (staticity / magnetism)` each frame: a first-order low-pass
/// filter, not a spring. Stronger magnetism pulls further; a larger `ease`
/// responds more slowly.
///
/// ### Parameters
/// - `p` - Particle to update.
/// - `pointer` - Pointer position relative to the canvas center.
/// - `staticity` - Field-wide resistance to the pointer.
/// - `ease` - Smoothing divisor.
#[inline]
pub fn attract(p: &mut Particle, pointer: Vec2, staticity: f32, ease: f32) {
    let target = pointer / (staticity / p.magnetism());
    p.offset += (target - p.offset) / ease;
}
