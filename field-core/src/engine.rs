//! The particle field engine.
//!
//! A [`FieldEngine`] is mounted once, then driven entirely by host
//! callbacks:
//! - [`FieldEngine::on_frame`] — one animation tick per requested frame.
//! - [`FieldEngine::on_resize`] — container resized; regeneration is
//!   debounced by [`RESIZE_DEBOUNCE`].
//! - [`FieldEngine::on_timeout`] — the debounce timer fired.
//! - [`FieldEngine::teardown`] — unmount; every later callback is a no-op.
//!
//! Pointer input arrives through a [`PointerSubscription`] that is polled at
//! the start of each frame.

use crate::{
    color::Rgb,
    config::FieldConfig,
    particle::Particle,
    phases,
    pointer::{PointerSubscription, PointerTracker},
    scheduler::{Debounce, FrameHandle, ManualScheduler, RESIZE_DEBOUNCE, Scheduler, TimerHandle},
    surface::Surface,
    types::Viewport,
};
use glam::{Affine2, Vec2};
use rand::rngs::StdRng;
use std::{f32::consts::TAU, time::Duration};
use tracing::{debug, trace};

/// Owns a particle pool and animates it onto a [`Surface`].
///
/// The surface is optional: without one the engine still simulates the pool
/// but skips every drawing call.
pub struct FieldEngine<S: Surface, C: Scheduler> {
    config: FieldConfig,
    tint: Rgb,
    surface: Option<S>,
    scheduler: C,
    rng: StdRng,

    /// Geometry the current pool was generated for.
    viewport: Viewport,
    /// Latest geometry reported by the host.
    host_viewport: Viewport,

    particles: Vec<Particle>,
    pointer: Option<PointerSubscription>,
    pointer_offset: Vec2,

    frame: Option<FrameHandle>,
    resize: Debounce,
    generation: u64,
    disposed: bool,
}

impl<S: Surface, C: Scheduler> FieldEngine<S, C> {
    /// Mounts a field into a container and starts the animation loop.
    ///
    /// Subscribes to `pointer`, generates and draws the initial pool, then
    /// requests the first frame from `scheduler`.
    ///
    /// ### Parameters
    /// - `config` - Field configuration; not validated.
    /// - `viewport` - Container geometry at mount time.
    /// - `surface` - Drawing context, or `None` if the host has none.
    /// - `scheduler` - Frame and timer primitives.
    /// - `rng` - Random source for particle sampling.
    /// - `pointer` - Shared pointer tracker.
    pub fn mount(
        config: FieldConfig,
        viewport: Viewport,
        surface: Option<S>,
        scheduler: C,
        rng: StdRng,
        pointer: &PointerTracker,
    ) -> Self {
        if surface.is_none() {
            debug!("no drawing surface, particle field will not draw");
        }

        let subscription = pointer.subscribe();
        let initial_pointer = subscription.latest();

        let mut engine = Self {
            tint: config.tint(),
            config,
            surface,
            scheduler,
            rng,
            viewport,
            host_viewport: viewport,
            particles: Vec::new(),
            pointer: Some(subscription),
            pointer_offset: Vec2::ZERO,
            frame: None,
            resize: Debounce::new(RESIZE_DEBOUNCE),
            generation: 0,
            disposed: false,
        };

        engine.track_pointer(initial_pointer);
        engine.init();
        engine.frame = Some(engine.scheduler.request_frame());
        engine
    }

    /// Runs one animation tick for `handle`.
    ///
    /// Ignored unless `handle` is the frame this engine is waiting for and
    /// the engine has not been torn down. Returns `true` if the tick ran.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        if self.disposed || self.frame != Some(handle) {
            trace!(?handle, "ignoring stale animation frame");
            return false;
        }
        self.frame = None;

        if let Some(page) = self.pointer.as_mut().and_then(PointerSubscription::changed) {
            self.track_pointer(page);
        }
        self.step();

        self.frame = Some(self.scheduler.request_frame());
        true
    }

    /// Host resize notification.
    ///
    /// Records the new geometry and re-arms the debounce timer; the pool is
    /// regenerated only when [`FieldEngine::on_timeout`] receives that timer.
    pub fn on_resize(&mut self, viewport: Viewport) {
        if self.disposed {
            trace!("ignoring resize after teardown");
            return;
        }
        self.host_viewport = viewport;
        self.resize.trigger(&mut self.scheduler);
        trace!(width = viewport.size.x, height = viewport.size.y, "resize deferred");
    }

    /// Host timer callback.
    pub fn on_timeout(&mut self, handle: TimerHandle) {
        if self.disposed || !self.resize.fire(handle) {
            return;
        }
        debug!("resize settled");
        self.init();
    }

    /// Replaces the configuration.
    ///
    /// Changing `refresh`, `color` or `quantity` regenerates the pool right
    /// away; everything else applies from the next frame.
    pub fn set_config(&mut self, config: FieldConfig) {
        let regenerate = config.refresh != self.config.refresh
            || config.color != self.config.color
            || config.quantity != self.config.quantity;

        self.tint = config.tint();
        self.config = config;

        if regenerate && !self.disposed {
            self.init();
        }
    }

    /// Forces a pool regeneration by bumping the `refresh` counter.
    pub fn refresh(&mut self) {
        let mut config = self.config.clone();
        config.refresh = config.refresh.wrapping_add(1);
        self.set_config(config);
    }

    /// Stops the engine.
    ///
    /// Cancels the pending frame and debounce timer and drops the pointer
    /// subscription. Safe to call more than once; also runs on drop.
    pub fn teardown(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        self.resize.cancel(&mut self.scheduler);
        self.pointer = None;

        debug!(generation = self.generation, "particle field torn down");
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn tint(&self) -> Rgb {
        self.tint
    }

    /// Geometry the current pool was generated for.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Pointer position relative to the canvas center that particles ease toward.
    pub fn pointer_offset(&self) -> Vec2 {
        self.pointer_offset
    }

    /// Number of times the pool has been generated since mount.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The frame this engine is waiting for, if any.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn scheduler(&self) -> &C {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut C {
        &mut self.scheduler
    }

    /// Sizes the surface, regenerates the pool and draws it once.
    fn init(&mut self) {
        self.viewport = self.host_viewport;
        let Viewport {
            size,
            device_pixel_ratio: dpr,
            ..
        } = self.viewport;

        if let Some(surface) = self.surface.as_mut() {
            surface.set_size(size * dpr);
            surface.scale(Vec2::splat(dpr));
        }

        let base_size = self.config.size;
        let rng = &mut self.rng;
        self.particles = (0..self.config.quantity)
            .map(|_| Particle::spawn(size, base_size, rng))
            .collect();

        if let Some(surface) = self.surface.as_mut() {
            surface.clear_rect(Vec2::ZERO, size);
            for p in &self.particles {
                draw_particle(surface, p, self.tint, dpr);
            }
        }

        self.generation += 1;
        debug!(
            generation = self.generation,
            quantity = self.particles.len(),
            width = size.x,
            height = size.y,
            "particle pool generated"
        );
    }

    /// Advances every particle one frame and redraws.
    ///
    /// The next pool is built into a fresh vector: each particle is either
    /// carried over updated or, if it escaped, replaced in place by a new one.
    fn step(&mut self) {
        let bounds = self.viewport.size;
        let dpr = self.viewport.device_pixel_ratio;
        let tint = self.tint;
        let pointer = self.pointer_offset;
        let FieldConfig {
            staticity,
            ease,
            size: base_size,
            drift,
            ..
        } = self.config;

        let mut surface = self.surface.as_mut();
        if let Some(s) = surface.as_deref_mut() {
            s.clear_rect(Vec2::ZERO, bounds);
        }

        let mut next = Vec::with_capacity(self.particles.len());
        for mut p in std::mem::take(&mut self.particles) {
            phases::edge_fade(&mut p, bounds);
            phases::drift(&mut p, drift);
            phases::attract(&mut p, pointer, staticity, ease);

            if let Some(s) = surface.as_deref_mut() {
                draw_particle(s, &p, tint, dpr);
            }

            if p.escaped(bounds) {
                let fresh = Particle::spawn(bounds, base_size, &mut self.rng);
                if let Some(s) = surface.as_deref_mut() {
                    draw_particle(s, &fresh, tint, dpr);
                }
                next.push(fresh);
            } else {
                next.push(p);
            }
        }
        self.particles = next;
    }

    /// Converts a page-space pointer position into a center-relative offset.
    ///
    /// Positions outside the canvas keep the previous offset.
    fn track_pointer(&mut self, page: Vec2) {
        let half = self.viewport.size / 2.0;
        let local = page - self.host_viewport.origin - half;
        let inside = local.x < half.x && local.x > -half.x && local.y < half.y && local.y > -half.y;
        if inside {
            self.pointer_offset = local;
        }
    }
}

impl<S: Surface> FieldEngine<S, ManualScheduler> {
    /// Advances the manual clock to `now` and delivers due timers only.
    ///
    /// Lets a paused host keep resize handling alive without animating.
    pub fn pump_timers(&mut self, now: Duration) {
        self.scheduler.advance_to(now);
        for handle in self.scheduler.take_due_timers() {
            self.on_timeout(handle);
        }
    }

    /// Advances the manual clock to `now`, delivers due timers, then runs
    /// pending frames until one is accepted.
    ///
    /// Returns `true` if a frame ran.
    pub fn pump(&mut self, now: Duration) -> bool {
        self.pump_timers(now);
        while let Some(handle) = self.scheduler.take_frame() {
            if self.on_frame(handle) {
                return true;
            }
        }
        false
    }
}

impl<S: Surface, C: Scheduler> Drop for FieldEngine<S, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Draws one particle at its rendered position, then restores the
/// device-pixel-ratio transform.
fn draw_particle<S: Surface + ?Sized>(surface: &mut S, p: &Particle, tint: Rgb, dpr: f32) {
    surface.translate(p.offset);
    surface.begin_path();
    surface.arc(p.pos, p.radius(), 0.0, TAU);
    surface.set_fill(tint.with_alpha(p.alpha()));
    surface.fill();
    surface.set_transform(Affine2::from_scale(Vec2::splat(dpr)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Canvas;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    type TestEngine = FieldEngine<Canvas, ManualScheduler>;

    fn config(quantity: usize) -> FieldConfig {
        FieldConfig {
            quantity,
            ..FieldConfig::default()
        }
    }

    fn mount(cfg: FieldConfig, viewport: Viewport, tracker: &PointerTracker) -> TestEngine {
        FieldEngine::mount(
            cfg,
            viewport,
            Some(Canvas::default()),
            ManualScheduler::new(),
            StdRng::seed_from_u64(1),
            tracker,
        )
    }

    fn frame(engine: &mut TestEngine) {
        let handle = engine.scheduler_mut().take_frame().expect("frame pending");
        engine.on_frame(handle);
    }

    #[test]
    fn mount_generates_draws_and_schedules() {
        let tracker = PointerTracker::new();
        let vp = Viewport::new(Vec2::new(100.0, 50.0), Vec2::ZERO, 2.0);
        let engine = mount(config(10), vp, &tracker);

        assert_eq!(engine.particles().len(), 10);
        assert_eq!(engine.generation(), 1);
        assert!(tracker.is_listening());

        let canvas = engine.surface().unwrap();
        assert_eq!(canvas.size(), Vec2::new(200.0, 100.0));
        assert_eq!(canvas.circles().len(), 10);
        assert_eq!(canvas.transform(), Affine2::from_scale(Vec2::splat(2.0)));

        assert_eq!(engine.scheduler().pending_frames(), 1);
        assert_eq!(engine.pending_frame(), engine.scheduler().peek_frame());
    }

    #[test]
    fn frame_redraws_every_particle_and_rearms() {
        let tracker = PointerTracker::new();
        let mut engine = mount(config(25), Viewport::with_size(Vec2::splat(300.0)), &tracker);

        for _ in 0..5 {
            frame(&mut engine);
            assert_eq!(engine.surface().unwrap().circles().len(), 25);
            assert_eq!(engine.scheduler().pending_frames(), 1);
        }
    }

    #[test]
    fn drawn_circles_sit_at_rendered_position_in_device_pixels() {
        let tracker = PointerTracker::new();
        let vp = Viewport::new(Vec2::splat(100.0), Vec2::ZERO, 2.0);
        let mut engine = mount(config(3), vp, &tracker);
        frame(&mut engine);

        let canvas = engine.surface().unwrap();
        for (p, c) in engine.particles().iter().zip(canvas.circles()) {
            assert_eq!(c.center, p.rendered_pos() * 2.0);
            assert_eq!(c.radius, p.radius() * 2.0);
            assert_eq!(c.color, Rgb::WHITE.with_alpha(p.alpha()));
        }
    }

    #[test]
    fn escaped_particle_is_replaced_in_the_same_frame() {
        let tracker = PointerTracker::new();
        let mut cfg = config(8);
        // Strong bias pushes everything off the right edge quickly.
        cfg.drift = Vec2::new(30.0, 0.0);
        let mut engine = mount(cfg, Viewport::with_size(Vec2::splat(100.0)), &tracker);

        for _ in 0..20 {
            frame(&mut engine);
            assert_eq!(engine.particles().len(), 8);
            for p in engine.particles() {
                assert!(!p.escaped(Vec2::splat(100.0)));
            }
        }
    }

    #[test]
    fn replacement_is_fresh_and_not_updated_this_frame() {
        let tracker = PointerTracker::new();
        let mut cfg = config(1);
        cfg.drift = Vec2::new(1000.0, 0.0);
        let mut engine = mount(cfg, Viewport::with_size(Vec2::splat(100.0)), &tracker);

        frame(&mut engine);

        let p = engine.particles()[0];
        assert_eq!(p.alpha(), 0.0);
        assert_eq!(p.offset, Vec2::ZERO);
        assert!(p.pos.x >= 0.0 && p.pos.x < 100.0);
        // Old circle plus its replacement.
        assert_eq!(engine.surface().unwrap().circles().len(), 2);
    }

    #[test]
    fn alpha_never_exceeds_target() {
        let tracker = PointerTracker::new();
        let mut cfg = config(60);
        cfg.drift = Vec2::new(0.3, -0.2);
        let mut engine = mount(cfg, Viewport::with_size(Vec2::new(120.0, 80.0)), &tracker);
        tracker.notify_move(Vec2::new(90.0, 10.0));

        for _ in 0..400 {
            frame(&mut engine);
            for p in engine.particles() {
                assert!(p.alpha() >= 0.0 && p.alpha() <= p.target_alpha());
            }
        }
    }

    #[test]
    fn pointer_inside_canvas_sets_centered_offset() {
        let tracker = PointerTracker::new();
        let vp = Viewport::new(Vec2::new(200.0, 100.0), Vec2::new(10.0, 20.0), 1.0);
        let mut engine = mount(config(1), vp, &tracker);

        tracker.notify_move(Vec2::new(160.0, 30.0));
        frame(&mut engine);

        assert_eq!(engine.pointer_offset(), Vec2::new(50.0, -40.0));
    }

    #[test]
    fn pointer_outside_canvas_keeps_last_offset() {
        let tracker = PointerTracker::new();
        let vp = Viewport::with_size(Vec2::splat(100.0));
        let mut engine = mount(config(1), vp, &tracker);

        tracker.notify_move(Vec2::new(75.0, 25.0));
        frame(&mut engine);
        assert_eq!(engine.pointer_offset(), Vec2::new(25.0, -25.0));

        // Exactly on the boundary counts as outside.
        tracker.notify_move(Vec2::new(100.0, 50.0));
        frame(&mut engine);
        assert_eq!(engine.pointer_offset(), Vec2::new(25.0, -25.0));

        tracker.notify_move(Vec2::new(500.0, -3.0));
        frame(&mut engine);
        assert_eq!(engine.pointer_offset(), Vec2::new(25.0, -25.0));
    }

    #[test]
    fn pointer_offset_pulls_render_offsets() {
        let tracker = PointerTracker::new();
        let mut engine = mount(config(20), Viewport::with_size(Vec2::splat(400.0)), &tracker);
        tracker.notify_move(Vec2::new(390.0, 200.0));

        for _ in 0..10 {
            frame(&mut engine);
        }
        for p in engine.particles() {
            if p.offset != Vec2::ZERO {
                assert!(p.offset.x > 0.0, "pulled toward the right");
            }
        }
    }

    #[test]
    fn resize_burst_regenerates_once() {
        let tracker = PointerTracker::new();
        let mut engine = mount(config(5), Viewport::with_size(Vec2::splat(100.0)), &tracker);

        for i in 1..=10u64 {
            engine.on_resize(Viewport::with_size(Vec2::splat(100.0 + i as f32)));
            engine.pump(Duration::from_millis(i * 50));
        }
        assert_eq!(engine.generation(), 1, "still inside the debounce window");

        engine.pump(Duration::from_millis(500 + 200));
        assert_eq!(engine.generation(), 2);
        assert_eq!(engine.viewport().size, Vec2::splat(110.0));
        assert_eq!(engine.particles().len(), 5);

        engine.pump(Duration::from_secs(5));
        assert_eq!(engine.generation(), 2);
    }

    #[test]
    fn resize_keeps_pointer_offset() {
        let tracker = PointerTracker::new();
        let mut engine = mount(config(2), Viewport::with_size(Vec2::splat(100.0)), &tracker);
        tracker.notify_move(Vec2::new(60.0, 60.0));
        frame(&mut engine);

        engine.on_resize(Viewport::with_size(Vec2::splat(300.0)));
        engine.pump(Duration::from_millis(250));

        assert_eq!(engine.generation(), 2);
        assert_eq!(engine.pointer_offset(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn refresh_and_color_changes_regenerate() {
        let tracker = PointerTracker::new();
        let mut engine = mount(config(4), Viewport::with_size(Vec2::splat(50.0)), &tracker);

        engine.refresh();
        assert_eq!(engine.generation(), 2);

        let mut cfg = engine.config().clone();
        cfg.color = "#f00".to_owned();
        engine.set_config(cfg);
        assert_eq!(engine.generation(), 3);
        assert_eq!(engine.tint(), Rgb::new(255, 0, 0));
        assert!(
            engine
                .surface()
                .unwrap()
                .circles()
                .iter()
                .all(|c| (c.color.r, c.color.g, c.color.b) == (255, 0, 0))
        );

        let mut cfg = engine.config().clone();
        cfg.quantity = 9;
        engine.set_config(cfg);
        assert_eq!(engine.particles().len(), 9);
        assert_eq!(engine.generation(), 4);

        let mut cfg = engine.config().clone();
        cfg.staticity = 10.0;
        cfg.drift = Vec2::new(0.1, 0.1);
        engine.set_config(cfg);
        assert_eq!(engine.generation(), 4, "tuning does not regenerate");
    }

    #[test]
    fn without_surface_pool_still_runs() {
        let tracker = PointerTracker::new();
        let mut engine: TestEngine = FieldEngine::mount(
            config(12),
            Viewport::with_size(Vec2::splat(100.0)),
            None,
            ManualScheduler::new(),
            StdRng::seed_from_u64(9),
            &tracker,
        );

        assert_eq!(engine.particles().len(), 12);
        assert!(engine.surface().is_none());
        for _ in 0..3 {
            assert!(engine.pump(Duration::ZERO));
        }
        assert_eq!(engine.particles().len(), 12);
    }

    #[test]
    fn teardown_cancels_everything_and_is_idempotent() {
        let tracker = PointerTracker::new();
        let mut engine = mount(config(3), Viewport::with_size(Vec2::splat(100.0)), &tracker);
        engine.on_resize(Viewport::with_size(Vec2::splat(120.0)));

        engine.teardown();
        engine.teardown();

        assert!(engine.is_disposed());
        assert_eq!(engine.scheduler().pending_frames(), 0);
        assert_eq!(engine.scheduler().pending_timers(), 0);
        assert!(!tracker.is_listening());
        assert!(!engine.pump(Duration::from_secs(1)));
    }

    #[test]
    fn late_callbacks_after_teardown_do_nothing() {
        let tracker = PointerTracker::new();
        let mut engine = mount(config(6), Viewport::with_size(Vec2::splat(100.0)), &tracker);
        let late_frame = engine.pending_frame().unwrap();
        engine.on_resize(Viewport::with_size(Vec2::splat(50.0)));
        let late_timer = TimerHandle::from_raw(late_frame.raw() + 1);

        engine.teardown();
        let before = engine.particles().to_vec();
        let calls = engine.surface().unwrap().calls();

        engine.on_frame(late_frame);
        engine.on_timeout(late_timer);
        engine.on_resize(Viewport::with_size(Vec2::splat(10.0)));

        assert_eq!(engine.particles(), before.as_slice());
        assert_eq!(engine.surface().unwrap().calls(), calls);
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn stale_frame_handle_is_ignored() {
        let tracker = PointerTracker::new();
        let mut engine = mount(config(2), Viewport::with_size(Vec2::splat(100.0)), &tracker);
        let first = engine.scheduler_mut().take_frame().unwrap();
        engine.on_frame(first);

        let snapshot = engine.particles().to_vec();
        engine.on_frame(first);
        assert_eq!(engine.particles(), snapshot.as_slice());
    }

    #[test]
    fn pump_skips_stale_frames_and_reports_only_real_ticks() {
        let tracker = PointerTracker::new();
        let mut engine = mount(config(2), Viewport::with_size(Vec2::splat(100.0)), &tracker);

        // Run the pending frame without taking it out of the scheduler.
        let first = engine.pending_frame().unwrap();
        assert!(engine.on_frame(first));
        assert!(!engine.on_frame(first));
        assert_eq!(engine.scheduler().pending_frames(), 2);

        // The stale handle is drained and the live one runs.
        assert!(engine.pump(Duration::from_millis(16)));
        assert_eq!(engine.scheduler().pending_frames(), 1);
        assert_ne!(engine.pending_frame(), Some(first));

        engine.teardown();
        assert!(!engine.pump(Duration::from_millis(32)));
    }

    #[test]
    fn pump_timers_settles_resize_without_a_frame() {
        let tracker = PointerTracker::new();
        let mut engine = mount(config(4), Viewport::with_size(Vec2::splat(100.0)), &tracker);
        let pending = engine.pending_frame();
        let calls = engine.surface().unwrap().calls();

        engine.on_resize(Viewport::with_size(Vec2::splat(60.0)));
        engine.pump_timers(RESIZE_DEBOUNCE / 2);
        assert_eq!(engine.generation(), 1);

        engine.pump_timers(RESIZE_DEBOUNCE);
        assert_eq!(engine.generation(), 2);
        assert_eq!(engine.viewport().size, Vec2::splat(60.0));
        assert!(engine.surface().unwrap().calls() > calls);
        assert_eq!(engine.pending_frame(), pending);
    }

    #[test]
    fn dropping_engine_detaches_pointer() {
        let tracker = PointerTracker::new();
        {
            let _engine = mount(config(1), Viewport::with_size(Vec2::splat(10.0)), &tracker);
            assert!(tracker.is_listening());
        }
        assert!(!tracker.is_listening());
    }
}
