use crate::graphics::{Canvas, Color};
use crate::math::distance;
use crate::particle::Particle;
use crate::state::SimulationContext;

/// Colors and stroke widths used for a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub background_start: Color,
    pub background_end: Color,
    pub connection_color: Color,
    pub connection_width: f64,
    pub highlight_color: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        RenderStyle {
            background_start: Color::rgba8(22, 31, 37, 0.7),
            background_end: Color::rgba8(30, 41, 59, 0.7),
            connection_color: Color::rgba8(99, 102, 241, 0.1),
            connection_width: 0.5,
            highlight_color: Color::rgba8(99, 102, 241, 0.1),
        }
    }
}

/// Paints simulation state; never mutates it
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    style: RenderStyle,
}

impl Renderer {
    /// Full animated frame: background, particles, connections, pointer highlight
    pub fn paint<C: Canvas + ?Sized>(&self, ctx: &SimulationContext, canvas: &mut C) {
        self.paint_background(ctx, canvas);
        self.paint_particles(ctx.field.particles(), canvas);

        let particles = ctx.field.particles();
        let threshold = ctx.device_class.connection_distance();
        for (i, j) in connections(particles, threshold) {
            canvas.stroke_line(
                particles[i].position,
                particles[j].position,
                self.style.connection_width,
                self.style.connection_color,
            );
        }

        if let Some(pointer) = ctx.interaction().pressing_at() {
            canvas.fill_circle(
                pointer,
                ctx.field.config().interaction_radius,
                self.style.highlight_color,
            );
        }
    }

    /// Still frame for reduced motion: background and particles at rest
    pub fn paint_static<C: Canvas + ?Sized>(&self, ctx: &SimulationContext, canvas: &mut C) {
        self.paint_background(ctx, canvas);
        self.paint_particles(ctx.field.particles(), canvas);
    }

    fn paint_background<C: Canvas + ?Sized>(&self, ctx: &SimulationContext, canvas: &mut C) {
        canvas.clear();
        canvas.fill_linear_gradient(
            [0.0, 0.0],
            [ctx.viewport.width, ctx.viewport.height],
            self.style.background_start,
            self.style.background_end,
        );
    }

    fn paint_particles<C: Canvas + ?Sized>(&self, particles: &[Particle], canvas: &mut C) {
        for particle in particles {
            canvas.fill_circle(particle.position, particle.radius(), particle.color());
        }
    }
}

/// Index pairs `(i, j)`, `i < j`, of particles closer than `threshold`
pub fn connections(particles: &[Particle], threshold: f64) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..particles.len() {
        for j in (i + 1)..particles.len() {
            if distance(&particles[i].position, &particles[j].position) < threshold {
                pairs.push((i, j));
            }
        }
    }
    pairs
}
