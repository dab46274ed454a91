use crate::field::ParticleField;
use crate::host::{FrameDelay, FrameId, Host, ListenerId, ListenerKind, ListenerOptions};
use crate::input::{InputEvent, Propagation};
use crate::particle::FieldConfig;
use crate::renderer::Renderer;
use crate::state::SimulationContext;
use crate::surface::{DeviceClass, Surface, Viewport};
use log::{debug, info};
use rand::rngs::StdRng;
use std::time::Instant;

/// Listeners the field registers on mount, with whether each may be passive
const LISTENERS: [(ListenerKind, bool); 9] = [
    (ListenerKind::Resize, true),
    (ListenerKind::PointerMove, true),
    (ListenerKind::PointerDown, true),
    (ListenerKind::PointerUp, true),
    (ListenerKind::PointerLeave, true),
    (ListenerKind::TouchStart, true),
    // Must be able to cancel scrolling while dragging
    (ListenerKind::TouchMove, false),
    (ListenerKind::TouchEnd, true),
    (ListenerKind::ReducedMotionChange, true),
];

/// Animation driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Constructed, not yet mounted
    Detached,
    /// One frame per display refresh, throttled on mobile
    Running,
    /// A single static frame; nothing scheduled
    ReducedMotion,
    /// Torn down; terminal
    Unmounted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverConfig {
    /// Forces a device class instead of deriving it from the viewport width
    pub device_class: Option<DeviceClass>,
    /// Frame rate cap on mobile-class viewports
    pub mobile_fps: u32,
    pub field: FieldConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            device_class: None,
            mobile_fps: 30,
            field: FieldConfig::default(),
        }
    }
}

/// The particle-field background: owns the simulation, its surface and its
/// registrations on the host, and drives the update/paint loop.
pub struct BackgroundField {
    ctx: SimulationContext,
    surface: Option<Surface>,
    renderer: Renderer,
    rng: StdRng,
    config: DriverConfig,
    mode: Mode,
    pending_frame: Option<FrameId>,
    listeners: Vec<ListenerId>,
    /// Set whenever the surface holds a frame the host has not presented
    dirty: bool,
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
}

impl BackgroundField {
    pub fn new(config: DriverConfig, renderer: Renderer, rng: StdRng) -> Self {
        let viewport = Viewport::new(0.0, 0.0, 1.0);
        BackgroundField {
            ctx: SimulationContext::new(
                ParticleField::new(config.field),
                viewport,
                config.device_class.unwrap_or(DeviceClass::Desktop),
            ),
            surface: None,
            renderer,
            rng,
            config,
            mode: Mode::Detached,
            pending_frame: None,
            listeners: Vec::new(),
            dirty: false,
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
        }
    }

    /// Registers listeners, acquires the surface and starts animating (or paints
    /// the static frame when reduced motion is preferred)
    pub fn mount<H: Host>(&mut self, host: &mut H) {
        if self.mode != Mode::Detached {
            return;
        }
        for (kind, passive) in LISTENERS {
            self.listeners.push(host.add_listener(kind, ListenerOptions { passive }));
        }
        self.attach(host);

        if host.prefers_reduced_motion() {
            self.enter_reduced_motion(host);
        } else {
            self.mode = Mode::Running;
            self.schedule(host);
        }
        info!(
            "mounted in {:?} mode with {} particles ({:?})",
            self.mode,
            self.ctx.field.len(),
            self.ctx.device_class
        );
    }

    /// Releases every registration; nothing scheduled or registered survives
    pub fn unmount<H: Host>(&mut self, host: &mut H) {
        if let Some(id) = self.pending_frame.take() {
            host.cancel_frame(id);
        }
        for id in self.listeners.drain(..) {
            host.remove_listener(id);
        }
        self.surface = None;
        if self.mode != Mode::Unmounted {
            info!("unmounted from {:?} mode", self.mode);
        }
        self.mode = Mode::Unmounted;
    }

    /// Frame callback for `id`; stale or cancelled ids are ignored
    pub fn on_frame<H: Host>(&mut self, host: &mut H, id: FrameId) {
        if self.pending_frame != Some(id) {
            debug!("ignoring stale frame {:?}", id);
            return;
        }
        self.pending_frame = None;
        if self.mode != Mode::Running {
            return;
        }

        // Without a surface this frame is skipped; the next one retries
        if self.attach(host) {
            self.ctx.step();
            if let Some(surface) = self.surface.as_mut() {
                self.renderer.paint(&self.ctx, surface.buffer_mut());
                self.dirty = true;
                self.count_frame();
            }
        }
        self.schedule(host);
    }

    /// Reacts to a change of the reduced-motion preference
    pub fn set_reduced_motion<H: Host>(&mut self, host: &mut H, reduced: bool) {
        match (self.mode, reduced) {
            (Mode::Running, true) => {
                self.enter_reduced_motion(host);
                info!("reduced motion on, animation stopped");
            }
            (Mode::ReducedMotion, false) => {
                self.mode = Mode::Running;
                self.schedule(host);
                info!("reduced motion off, animation resumed");
            }
            _ => {}
        }
    }

    /// Re-reads the viewport, resizes the surface and reseeds the particles
    pub fn resize<H: Host>(&mut self, host: &mut H) {
        if !self.is_mounted() {
            return;
        }
        match host.viewport().filter(|v| !v.is_empty()) {
            Some(viewport) => {
                match self.surface.as_mut() {
                    Some(surface) => surface.resize(viewport),
                    None => self.surface = Some(Surface::new(viewport)),
                }
                self.seed_for(viewport);
                debug!(
                    "resized to {}x{} @{}, {} particles",
                    viewport.width,
                    viewport.height,
                    viewport.device_pixel_ratio,
                    self.ctx.field.len()
                );
                if self.mode == Mode::ReducedMotion {
                    self.paint_static();
                }
            }
            None => {
                debug!("viewport went away, detaching surface");
                self.surface = None;
            }
        }
    }

    /// Replaces the particle set for the current viewport
    pub fn reseed(&mut self) {
        if self.surface.is_none() {
            return;
        }
        let viewport = self.ctx.viewport;
        self.seed_for(viewport);
        if self.mode == Mode::ReducedMotion {
            self.paint_static();
        }
        debug!("reseeded {} particles", self.ctx.field.len());
    }

    /// Feeds one pointer or touch event into the interaction state
    pub fn handle_input(&mut self, event: InputEvent) -> Propagation {
        if !self.is_mounted() {
            return Propagation::Continue;
        }
        self.ctx.input.handle(event)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self.mode, Mode::Running | Mode::ReducedMotion)
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    #[cfg(test)]
    pub fn pending_frame(&self) -> Option<FrameId> {
        self.pending_frame
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Returns whether a new frame was painted since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Creates the surface and seeds the field once the host has a viewport
    fn attach<H: Host>(&mut self, host: &H) -> bool {
        if self.surface.is_some() {
            return true;
        }
        let Some(viewport) = host.viewport().filter(|v| !v.is_empty()) else {
            return false;
        };
        self.surface = Some(Surface::new(viewport));
        self.seed_for(viewport);
        true
    }

    fn seed_for(&mut self, viewport: Viewport) {
        let device_class = self
            .config
            .device_class
            .unwrap_or_else(|| viewport.device_class());
        self.ctx.viewport = viewport;
        self.ctx.device_class = device_class;
        self.ctx.field.reseed(
            &mut self.rng,
            viewport.width,
            viewport.height,
            device_class.particle_count(),
        );
    }

    fn enter_reduced_motion<H: Host>(&mut self, host: &mut H) {
        if let Some(id) = self.pending_frame.take() {
            host.cancel_frame(id);
        }
        self.mode = Mode::ReducedMotion;
        if self.attach(host) {
            self.ctx.field.rest();
            self.paint_static();
        }
    }

    fn paint_static(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            self.renderer.paint_static(&self.ctx, surface.buffer_mut());
            self.dirty = true;
        }
    }

    fn schedule<H: Host>(&mut self, host: &mut H) {
        if let Some(id) = self.pending_frame.take() {
            host.cancel_frame(id);
        }
        let delay = match self.ctx.device_class.frame_interval(self.config.mobile_fps) {
            Some(interval) => FrameDelay::After(interval),
            None => FrameDelay::NextRefresh,
        };
        self.pending_frame = Some(host.request_frame(delay));
    }

    fn count_frame(&mut self) {
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }
    }
}
