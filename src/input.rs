use crate::math::Point;

/// Pointer state shared by every particle for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Interaction {
    /// Last known pointer position; `None` until the first pointer or touch event
    pub pointer: Option<Point>,
    /// Whether a button is held or a finger is down
    pub active: bool,
}

impl Interaction {
    /// The pointer position, but only while it is pressing
    pub fn pressing_at(&self) -> Option<Point> {
        if self.active {
            self.pointer
        } else {
            None
        }
    }
}

/// Pointer and touch input, already mapped into logical surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove(Point),
    PointerDown,
    PointerUp,
    PointerLeave,
    TouchStart(Point),
    TouchMove(Point),
    TouchEnd,
}

/// What the host should do with the platform's default handling of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    /// Scrolling or gestures must not run for this event
    PreventDefault,
}

/// Folds pointer and touch events into a single [`Interaction`], last write wins
#[derive(Debug, Default)]
pub struct InputTracker {
    interaction: Interaction,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn handle(&mut self, event: InputEvent) -> Propagation {
        match event {
            InputEvent::PointerMove(p) => {
                self.set_pointer(p);
            }
            InputEvent::PointerDown => {
                self.interaction.active = true;
            }
            InputEvent::TouchStart(p) => {
                self.interaction.active = true;
                self.set_pointer(p);
            }
            InputEvent::TouchMove(p) => {
                self.set_pointer(p);
                return Propagation::PreventDefault;
            }
            // Leaving or lifting deactivates but keeps the last position
            InputEvent::PointerUp | InputEvent::TouchEnd | InputEvent::PointerLeave => {
                self.interaction.active = false;
            }
        }
        Propagation::Continue
    }

    fn set_pointer(&mut self, p: Point) {
        if p[0].is_finite() && p[1].is_finite() {
            self.interaction.pointer = Some(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_absent_and_inactive() {
        let tracker = InputTracker::new();
        assert_eq!(tracker.interaction(), Interaction::default());
        assert_eq!(tracker.interaction().pointer, None);
    }

    #[test]
    fn mouse_press_cycle() {
        let mut tracker = InputTracker::new();
        tracker.handle(InputEvent::PointerMove([10.0, 20.0]));
        assert_eq!(tracker.interaction().pointer, Some([10.0, 20.0]));
        assert!(!tracker.interaction().active);

        tracker.handle(InputEvent::PointerDown);
        assert_eq!(tracker.interaction().pressing_at(), Some([10.0, 20.0]));

        tracker.handle(InputEvent::PointerUp);
        assert!(!tracker.interaction().active);
        assert_eq!(tracker.interaction().pointer, Some([10.0, 20.0]));
    }

    #[test]
    fn leave_is_inactive_not_absent() {
        let mut tracker = InputTracker::new();
        tracker.handle(InputEvent::PointerMove([1.0, 2.0]));
        tracker.handle(InputEvent::PointerDown);
        tracker.handle(InputEvent::PointerLeave);
        let interaction = tracker.interaction();
        assert!(!interaction.active);
        assert_eq!(interaction.pointer, Some([1.0, 2.0]));
        assert_eq!(interaction.pressing_at(), None);
    }

    #[test]
    fn touch_sets_position_and_blocks_scrolling() {
        let mut tracker = InputTracker::new();
        assert_eq!(
            tracker.handle(InputEvent::TouchStart([5.0, 5.0])),
            Propagation::Continue
        );
        assert!(tracker.interaction().active);
        assert_eq!(
            tracker.handle(InputEvent::TouchMove([6.0, 7.0])),
            Propagation::PreventDefault
        );
        assert_eq!(tracker.interaction().pointer, Some([6.0, 7.0]));
        tracker.handle(InputEvent::TouchEnd);
        assert!(!tracker.interaction().active);
    }

    #[test]
    fn non_finite_positions_are_dropped() {
        let mut tracker = InputTracker::new();
        tracker.handle(InputEvent::PointerMove([3.0, 4.0]));
        tracker.handle(InputEvent::PointerMove([f64::NAN, 4.0]));
        assert_eq!(tracker.interaction().pointer, Some([3.0, 4.0]));
    }
}
