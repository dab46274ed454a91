use crate::graphics::{Canvas, Color};
use crate::input::InputEvent;
use crate::math::Point;

/// Damped spring parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl Default for Spring {
    fn default() -> Self {
        Spring {
            stiffness: 300.0,
            damping: 20.0,
            mass: 0.5,
        }
    }
}

/// A value chasing a target through a spring
#[derive(Debug, Clone, Copy, PartialEq)]
struct Animated<const N: usize> {
    value: [f64; N],
    velocity: [f64; N],
    target: [f64; N],
}

impl<const N: usize> Animated<N> {
    fn at(value: [f64; N]) -> Self {
        Animated {
            value,
            velocity: [0.0; N],
            target: value,
        }
    }

    fn snap(&mut self, value: [f64; N]) {
        *self = Animated::at(value);
    }

    fn advance(&mut self, spring: &Spring, dt: f64) {
        // Semi-implicit Euler with bounded substeps stays stable at these stiffnesses
        const MAX_STEP: f64 = 1.0 / 240.0;
        let mut remaining = dt.clamp(0.0, 0.25);
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP);
            for i in 0..N {
                let force = -spring.stiffness * (self.value[i] - self.target[i])
                    - spring.damping * self.velocity[i];
                self.velocity[i] += force / spring.mass * h;
                self.value[i] += self.velocity[i] * h;
            }
            remaining -= h;
        }
    }

    fn is_settled(&self) -> bool {
        (0..N).all(|i| {
            (self.value[i] - self.target[i]).abs() < 0.01 && self.velocity[i].abs() < 0.01
        })
    }
}

/// Ring-and-dot pointer cursor drawn above the field on desktop-class viewports
#[derive(Debug, Clone)]
pub struct PointerCursor {
    spring: Spring,
    position: Animated<2>,
    ring_scale: Animated<1>,
    dot_scale: Animated<1>,
    visible: bool,
    color: Color,
}

impl PointerCursor {
    pub const RING_RADIUS: f64 = 16.0;
    pub const RING_WIDTH: f64 = 2.0;
    pub const DOT_RADIUS: f64 = 4.0;

    pub fn new(spring: Spring) -> Self {
        PointerCursor {
            spring,
            position: Animated::at([0.0, 0.0]),
            ring_scale: Animated::at([1.0]),
            dot_scale: Animated::at([1.0]),
            visible: false,
            color: Color::rgb8(99, 102, 241),
        }
    }

    pub fn handle(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::PointerMove(p) => {
                if !self.visible {
                    // Appear where the pointer is rather than sliding in from afar
                    self.position.snap(p);
                    self.visible = true;
                }
                self.position.target = p;
            }
            InputEvent::PointerDown => {
                self.ring_scale.target = [0.8];
                self.dot_scale.target = [1.5];
            }
            InputEvent::PointerUp => {
                self.ring_scale.target = [1.0];
                self.dot_scale.target = [1.0];
            }
            InputEvent::PointerLeave => {
                self.visible = false;
            }
            InputEvent::TouchStart(_) | InputEvent::TouchMove(_) | InputEvent::TouchEnd => {}
        }
    }

    /// Moves the cursor `dt` seconds along its springs
    pub fn advance(&mut self, dt: f64) {
        self.position.advance(&self.spring, dt);
        self.ring_scale.advance(&self.spring, dt);
        self.dot_scale.advance(&self.spring, dt);
    }

    /// Jumps straight to the targets, for reduced motion
    pub fn settle(&mut self) {
        self.position.snap(self.position.target);
        self.ring_scale.snap(self.ring_scale.target);
        self.dot_scale.snap(self.dot_scale.target);
    }

    pub fn is_animating(&self) -> bool {
        self.visible
            && !(self.position.is_settled()
                && self.ring_scale.is_settled()
                && self.dot_scale.is_settled())
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[cfg(test)]
    pub fn position(&self) -> Point {
        self.position.value
    }

    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        if !self.visible {
            return;
        }
        let center: Point = self.position.value;
        canvas.stroke_circle(
            center,
            Self::RING_RADIUS * self.ring_scale.value[0],
            Self::RING_WIDTH,
            self.color,
        );
        canvas.fill_circle(center, Self::DOT_RADIUS * self.dot_scale.value[0], self.color);
    }
}
