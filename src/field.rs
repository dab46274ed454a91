use crate::input::Interaction;
use crate::particle::{FieldConfig, Particle};
use rand::Rng;

/// The fixed particle set and the bounds it lives in.
///
/// Particles are only ever replaced wholesale by [`ParticleField::reseed`].
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    width: f64,
    height: f64,
    config: FieldConfig,
}

impl ParticleField {
    pub fn new(config: FieldConfig) -> Self {
        ParticleField {
            particles: Vec::new(),
            width: 0.0,
            height: 0.0,
            config,
        }
    }

    /// Replaces every particle with `count` fresh ones spawned inside `width x height`
    pub fn reseed<R: Rng>(&mut self, rng: &mut R, width: f64, height: f64, count: usize) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.particles = (0..count)
            .map(|_| Particle::spawn(rng, self.width, self.height))
            .collect();
    }

    /// Advances every particle one frame
    pub fn step(&mut self, interaction: &Interaction) {
        for particle in &mut self.particles {
            particle.update(interaction, &self.config, self.width, self.height);
        }
    }

    /// Returns every particle to its unhighlighted look without moving it
    pub fn rest(&mut self) {
        for particle in &mut self.particles {
            particle.rest();
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[cfg(test)]
    pub fn bounds(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn from_particles(particles: Vec<Particle>, width: f64, height: f64) -> Self {
        ParticleField {
            particles,
            width,
            height,
            config: FieldConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Viewport;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn reseed_counts_follow_device_class() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = ParticleField::new(FieldConfig::default());

        let desktop = Viewport::new(1024.0, 768.0, 1.0);
        field.reseed(
            &mut rng,
            desktop.width,
            desktop.height,
            desktop.device_class().particle_count(),
        );
        assert_eq!(field.len(), 80);

        let mobile = Viewport::new(375.0, 667.0, 1.0);
        field.reseed(
            &mut rng,
            mobile.width,
            mobile.height,
            mobile.device_class().particle_count(),
        );
        assert_eq!(field.len(), 30);
        assert_eq!(field.bounds(), (375.0, 667.0));
    }

    #[test]
    fn particles_stay_in_bounds_under_any_input() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut field = ParticleField::new(FieldConfig::default());
        field.reseed(&mut rng, 640.0, 480.0, 80);

        for frame in 0..2000 {
            let interaction = Interaction {
                pointer: Some([
                    rng.gen_range(-50.0..700.0),
                    rng.gen_range(-50.0..530.0),
                ]),
                active: frame % 3 != 0,
            };
            field.step(&interaction);
            for p in field.particles() {
                assert!((0.0..=640.0).contains(&p.position[0]), "x = {}", p.position[0]);
                assert!((0.0..=480.0).contains(&p.position[1]), "y = {}", p.position[1]);
                assert!(p.radius() >= p.base_radius());
                if !interaction.active {
                    assert_eq!(p.radius(), p.base_radius());
                }
            }
        }
    }

    #[test]
    fn hue_never_changes() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = ParticleField::new(FieldConfig::default());
        field.reseed(&mut rng, 300.0, 300.0, 10);
        let hues: Vec<f64> = field.particles().iter().map(|p| p.hue()).collect();
        let pressing = Interaction {
            pointer: Some([150.0, 150.0]),
            active: true,
        };
        for _ in 0..100 {
            field.step(&pressing);
        }
        let after: Vec<f64> = field.particles().iter().map(|p| p.hue()).collect();
        assert_eq!(hues, after);
    }

    #[test]
    fn empty_viewport_is_harmless() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut field = ParticleField::new(FieldConfig::default());
        field.reseed(&mut rng, 0.0, 0.0, 5);
        field.step(&Interaction::default());
        assert!(field.particles().iter().all(|p| p.position == [0.0, 0.0]));
    }
}
