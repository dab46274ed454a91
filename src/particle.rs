use crate::graphics::Color;
use crate::input::Interaction;
use crate::math::{distance, normalize, sub, Point};
use rand::Rng;

/// Tunables for the per-frame particle update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldConfig {
    /// Pointer influence reaches this far, in logical units
    pub interaction_radius: f64,
    /// Fraction of the offset to the anchor closed per idle frame
    pub home_rate: f64,
    /// Offsets at or below this are left alone by homing
    pub home_epsilon: f64,
    /// Fraction of the drift velocity applied per idle frame
    pub drift_rate: f64,
    /// Extra radius at zero distance from a pressing pointer
    pub radius_gain: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            interaction_radius: 100.0,
            home_rate: 0.05,
            home_epsilon: 0.1,
            drift_rate: 0.2,
            radius_gain: 3.0,
        }
    }
}

/// One dot of the field
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Point,
    pub anchor: Point,
    pub velocity: [f64; 2],
    base_radius: f64,
    radius: f64,
    hue: f64,
    density: f64,
    highlighted: bool,
}

impl Particle {
    pub fn new(
        position: Point,
        velocity: [f64; 2],
        base_radius: f64,
        hue: f64,
        density: f64,
    ) -> Self {
        Particle {
            position,
            anchor: position,
            velocity,
            base_radius,
            radius: base_radius,
            hue,
            density,
            highlighted: false,
        }
    }

    /// Spawns a particle anchored at a uniformly random spot inside `width x height`
    pub fn spawn<R: Rng>(rng: &mut R, width: f64, height: f64) -> Self {
        let position = [
            rng.gen::<f64>() * width.max(0.0),
            rng.gen::<f64>() * height.max(0.0),
        ];
        let velocity = [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)];
        let base_radius = rng.gen_range(1.0..4.0);
        let hue = rng.gen_range(240.0..300.0);
        let density = rng.gen_range(1.0..31.0);
        Particle::new(position, velocity, base_radius, hue, density)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[cfg(test)]
    pub fn base_radius(&self) -> f64 {
        self.base_radius
    }

    #[cfg(test)]
    pub fn hue(&self) -> f64 {
        self.hue
    }

    #[cfg(test)]
    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn color(&self) -> Color {
        if self.highlighted {
            Color::hsl(self.hue, 0.9, 0.7)
        } else {
            Color::hsl(self.hue, 0.7, 0.6)
        }
    }

    /// Advances the particle by one frame inside a `width x height` viewport
    pub fn update(
        &mut self,
        interaction: &Interaction,
        config: &FieldConfig,
        width: f64,
        height: f64,
    ) {
        if !interaction.active {
            self.drift_home(config);
        }

        match interaction.pressing_at() {
            Some(pointer) => self.repel_from(pointer, config),
            None => self.rest(),
        }

        self.reflect(width, height);
    }

    fn drift_home(&mut self, config: &FieldConfig) {
        let offset = sub(&self.anchor, &self.position);
        for axis in 0..2 {
            if offset[axis].abs() > config.home_epsilon {
                self.position[axis] += offset[axis] * config.home_rate;
            }
            self.position[axis] += self.velocity[axis] * config.drift_rate;
        }
    }

    fn repel_from(&mut self, pointer: Point, config: &FieldConfig) {
        let to_pointer = sub(&pointer, &self.position);
        let dist = distance(&pointer, &self.position);
        if !(dist < config.interaction_radius) {
            self.rest();
            return;
        }

        let force = (config.interaction_radius - dist) / config.interaction_radius;
        // A pointer sitting exactly on the particle has no direction to push along
        if let Some(direction) = normalize(&to_pointer) {
            self.position[0] -= direction[0] * force * self.density;
            self.position[1] -= direction[1] * force * self.density;
        }
        self.radius = self.base_radius + force.max(0.0) * config.radius_gain;
        self.highlighted = true;
    }

    /// Drops any pointer highlight, back to base radius and color
    pub fn rest(&mut self) {
        self.radius = self.base_radius;
        self.highlighted = false;
    }

    fn reflect(&mut self, width: f64, height: f64) {
        let bounds = [width.max(0.0), height.max(0.0)];
        for axis in 0..2 {
            if !self.position[axis].is_finite() {
                self.position[axis] = self.anchor[axis].clamp(0.0, bounds[axis]);
            }
            if !self.velocity[axis].is_finite() {
                self.velocity[axis] = 0.0;
            }
            if self.position[axis] > bounds[axis] {
                self.position[axis] = bounds[axis];
                self.velocity[axis] = -self.velocity[axis];
            } else if self.position[axis] < 0.0 {
                self.position[axis] = 0.0;
                self.velocity[axis] = -self.velocity[axis];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn idle() -> Interaction {
        Interaction::default()
    }

    fn pressing(at: Point) -> Interaction {
        Interaction {
            pointer: Some(at),
            active: true,
        }
    }

    #[test]
    fn spawn_respects_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = Particle::spawn(&mut rng, 300.0, 200.0);
            assert!((0.0..300.0).contains(&p.position[0]));
            assert!((0.0..200.0).contains(&p.position[1]));
            assert_eq!(p.anchor, p.position);
            assert!((1.0..4.0).contains(&p.base_radius()));
            assert_eq!(p.radius(), p.base_radius());
            assert!((240.0..300.0).contains(&p.hue()));
            assert!((1.0..31.0).contains(&p.density()));
            assert!(p.velocity.iter().all(|v| (-1.0..1.0).contains(v)));
        }
    }

    #[test]
    fn reflects_off_right_edge() {
        let mut p = Particle::new([800.0, 100.0], [0.5, 0.0], 2.0, 250.0, 10.0);
        p.update(&idle(), &FieldConfig::default(), 800.0, 600.0);
        assert!(p.position[0] <= 800.0);
        assert_eq!(p.velocity[0], -0.5);
    }

    #[test]
    fn reflects_off_top_edge() {
        let mut p = Particle::new([50.0, 0.0], [0.0, -0.8], 2.0, 250.0, 10.0);
        p.update(&idle(), &FieldConfig::default(), 800.0, 600.0);
        assert_eq!(p.position[1], 0.0);
        assert_eq!(p.velocity[1], 0.8);
    }

    #[test]
    fn idle_homing_converges_then_stops() {
        let config = FieldConfig::default();
        let mut p = Particle::new([500.0, 300.0], [0.0, 0.0], 2.0, 250.0, 10.0);
        p.position = [600.0, 300.0];

        let mut last = distance(&p.position, &p.anchor);
        let mut frames = 0;
        while last > config.home_epsilon {
            p.update(&idle(), &config, 1000.0, 1000.0);
            let now = distance(&p.position, &p.anchor);
            assert!(now < last, "distance grew from {last} to {now}");
            last = now;
            frames += 1;
            assert!(frames < 1000);
        }

        let settled = p.position;
        for _ in 0..10 {
            p.update(&idle(), &config, 1000.0, 1000.0);
        }
        assert_eq!(p.position, settled);
    }

    #[test]
    fn pointer_on_particle_stays_finite() {
        let mut p = Particle::new([100.0, 100.0], [0.3, 0.3], 2.0, 250.0, 10.0);
        p.update(&pressing([100.0, 100.0]), &FieldConfig::default(), 800.0, 600.0);
        assert!(p.position[0].is_finite() && p.position[1].is_finite());
        assert_eq!(p.position, [100.0, 100.0]);
        assert!(p.radius().is_finite());
        assert!(p.is_highlighted());
    }

    #[test]
    fn pressing_pointer_pushes_away_and_inflates() {
        let config = FieldConfig::default();
        let mut p = Particle::new([100.0, 100.0], [0.0, 0.0], 2.0, 250.0, 10.0);
        p.update(&pressing([150.0, 100.0]), &config, 800.0, 600.0);
        // force = (100 - 50) / 100 = 0.5, pushed by 0.5 * density to the left
        assert!((p.position[0] - 95.0).abs() < 1e-9);
        assert_eq!(p.position[1], 100.0);
        assert!((p.radius() - 3.5).abs() < 1e-9);
        assert_eq!(p.color(), Color::hsl(250.0, 0.9, 0.7));
    }

    #[test]
    fn radius_reverts_when_released_or_out_of_range() {
        let config = FieldConfig::default();
        let mut p = Particle::new([100.0, 100.0], [0.0, 0.0], 2.0, 250.0, 10.0);
        p.update(&pressing([120.0, 100.0]), &config, 800.0, 600.0);
        assert!(p.radius() > p.base_radius());

        let released = Interaction {
            pointer: Some([120.0, 100.0]),
            active: false,
        };
        p.update(&released, &config, 800.0, 600.0);
        assert_eq!(p.radius(), p.base_radius());
        assert_eq!(p.color(), Color::hsl(250.0, 0.7, 0.6));

        p.update(&pressing([120.0, 100.0]), &config, 800.0, 600.0);
        p.update(&pressing([700.0, 500.0]), &config, 800.0, 600.0);
        assert_eq!(p.radius(), p.base_radius());
        assert!(!p.is_highlighted());
    }

    #[test]
    fn rest_clears_highlight_in_place() {
        let mut p = Particle::new([100.0, 100.0], [0.0, 0.0], 2.0, 250.0, 10.0);
        p.update(&pressing([120.0, 100.0]), &FieldConfig::default(), 800.0, 600.0);
        let pushed_to = p.position;

        p.rest();
        assert_eq!(p.position, pushed_to);
        assert_eq!(p.radius(), p.base_radius());
        assert_eq!(p.color(), Color::hsl(250.0, 0.7, 0.6));
    }

    #[test]
    fn homing_resumes_after_release() {
        let config = FieldConfig::default();
        let mut p = Particle::new([100.0, 100.0], [0.0, 0.0], 2.0, 250.0, 10.0);
        for _ in 0..5 {
            p.update(&pressing([130.0, 100.0]), &config, 800.0, 600.0);
        }
        let pushed = distance(&p.position, &p.anchor);
        assert!(pushed > 1.0);

        let released = Interaction {
            pointer: Some([130.0, 100.0]),
            active: false,
        };
        p.update(&released, &config, 800.0, 600.0);
        assert!(distance(&p.position, &p.anchor) < pushed);
    }
}
