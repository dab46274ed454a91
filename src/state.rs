use crate::field::ParticleField;
use crate::input::{InputTracker, Interaction};
use crate::surface::{DeviceClass, Viewport};

/// Simulation context handed by reference to the update and paint passes
#[derive(Debug)]
pub struct SimulationContext {
    /// Particle set, seeded for `viewport`
    pub field: ParticleField,
    /// Pointer and touch state, written by input handlers between frames
    pub input: InputTracker,
    /// Viewport the field was last seeded for
    pub viewport: Viewport,
    /// Device class in effect; sizes the particle count and connection distance
    pub device_class: DeviceClass,
}

impl SimulationContext {
    pub fn new(field: ParticleField, viewport: Viewport, device_class: DeviceClass) -> Self {
        SimulationContext {
            field,
            input: InputTracker::new(),
            viewport,
            device_class,
        }
    }

    pub fn interaction(&self) -> Interaction {
        self.input.interaction()
    }

    /// Advances the field one frame with the latest interaction
    pub fn step(&mut self) {
        let interaction = self.input.interaction();
        self.field.step(&interaction);
    }
}
