use crate::surface::Viewport;
use std::time::Duration;

/// Handle for a scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Handle for a registered event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Events the field subscribes to on its host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Resize,
    PointerMove,
    PointerDown,
    PointerUp,
    PointerLeave,
    TouchStart,
    TouchMove,
    TouchEnd,
    ReducedMotionChange,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// A passive listener promises never to prevent the default action
    pub passive: bool,
}

/// When the next frame callback should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDelay {
    /// At the next display refresh
    NextRefresh,
    /// No sooner than this, then at the following refresh
    After(Duration),
}

/// Everything the background field needs from the page or terminal hosting it
pub trait Host {
    /// Current viewport, or `None` while there is nothing to draw into
    fn viewport(&self) -> Option<Viewport>;
    fn prefers_reduced_motion(&self) -> bool;
    fn add_listener(&mut self, kind: ListenerKind, options: ListenerOptions) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId);
    fn request_frame(&mut self, delay: FrameDelay) -> FrameId;
    fn cancel_frame(&mut self, id: FrameId);
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::BTreeMap;

    /// Records scheduling and listener registration so tests can check for leaks
    #[derive(Debug, Default)]
    pub struct MockHost {
        pub viewport: Option<Viewport>,
        pub reduced_motion: bool,
        pub listeners: BTreeMap<ListenerId, (ListenerKind, ListenerOptions)>,
        pub pending: BTreeMap<FrameId, FrameDelay>,
        pub requested: Vec<FrameDelay>,
        pub cancelled: usize,
        next_id: u64,
    }

    impl MockHost {
        pub fn new(viewport: Viewport) -> Self {
            MockHost {
                viewport: Some(viewport),
                ..Default::default()
            }
        }

        /// Removes and returns the oldest pending frame, as a display refresh would
        pub fn next_frame(&mut self) -> Option<FrameId> {
            let id = *self.pending.keys().next()?;
            self.pending.remove(&id);
            Some(id)
        }

        pub fn listening_to(&self, kind: ListenerKind) -> Option<ListenerOptions> {
            self.listeners
                .values()
                .find(|(k, _)| *k == kind)
                .map(|(_, options)| *options)
        }

        fn next_id(&mut self) -> u64 {
            self.next_id += 1;
            self.next_id
        }
    }

    impl Host for MockHost {
        fn viewport(&self) -> Option<Viewport> {
            self.viewport
        }

        fn prefers_reduced_motion(&self) -> bool {
            self.reduced_motion
        }

        fn add_listener(&mut self, kind: ListenerKind, options: ListenerOptions) -> ListenerId {
            let id = ListenerId(self.next_id());
            self.listeners.insert(id, (kind, options));
            id
        }

        fn remove_listener(&mut self, id: ListenerId) {
            self.listeners.remove(&id);
        }

        fn request_frame(&mut self, delay: FrameDelay) -> FrameId {
            let id = FrameId(self.next_id());
            self.pending.insert(id, delay);
            self.requested.push(delay);
            id
        }

        fn cancel_frame(&mut self, id: FrameId) {
            if self.pending.remove(&id).is_some() {
                self.cancelled += 1;
            }
        }
    }
}
