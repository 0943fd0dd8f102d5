//! Update notifications.
//!
//! Listeners are called synchronously on the agent's execution context, in
//! the order they were registered. A slow listener delays the agent.

use core::fmt;

use heapless::Vec;

/// Default capacity of the listener table.
pub const MAX_LISTENERS: usize = 4;

/// Receives update notifications from the agent. Both callbacks default to
/// doing nothing.
///
/// ```rust
/// use core::cell::Cell;
/// use libota::ota::{Listeners, UpdateListener};
///
/// struct Flag(Cell<bool>);
///
/// impl UpdateListener for Flag {
///     fn on_will_update(&self) {
///         self.0.set(true);
///     }
/// }
///
/// let flag = Flag(Cell::new(false));
/// let mut listeners: Listeners<'_> = Listeners::new();
/// listeners.register(&flag).unwrap();
/// listeners.notify_will_update();
/// assert!(flag.0.get());
/// ```
pub trait UpdateListener {
    /// A newer image `target_uuid` is available.
    fn on_update_available(&self, _target_uuid: &str) {}

    /// The agent is about to start downloading. Save state here; the device
    /// reboots once the image is committed.
    fn on_will_update(&self) {}
}

/// The listener table is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerError {
    /// No free slot left.
    Full,
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::Full => f.write_str("listener table full"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ListenerError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ListenerError::Full => defmt::write!(f, "Full"),
        }
    }
}

/// Fixed-capacity, ordered listener table.
pub struct Listeners<'a, const N: usize = MAX_LISTENERS> {
    entries: Vec<&'a dyn UpdateListener, N>,
}

impl<'a, const N: usize> Listeners<'a, N> {
    /// An empty table.
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends `listener`; fails once `N` listeners are registered.
    pub fn register(&mut self, listener: &'a dyn UpdateListener) -> Result<(), ListenerError> {
        self.entries.push(listener).map_err(|_| ListenerError::Full)
    }

    /// Calls every listener's [`UpdateListener::on_update_available`].
    pub fn notify_update_available(&self, target_uuid: &str) {
        for listener in &self.entries {
            listener.on_update_available(target_uuid);
        }
    }

    /// Calls every listener's [`UpdateListener::on_will_update`].
    pub fn notify_will_update(&self) {
        for listener in &self.entries {
            listener.on_will_update();
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<const N: usize> Default for Listeners<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for Listeners<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .field("capacity", &N)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use super::*;

    struct Recorder<'l> {
        id: u8,
        log: &'l RefCell<heapless::Vec<(u8, char), 16>>,
    }

    impl UpdateListener for Recorder<'_> {
        fn on_update_available(&self, target_uuid: &str) {
            assert_eq!(target_uuid, "target");
            self.log.borrow_mut().push((self.id, 'a')).unwrap();
        }

        fn on_will_update(&self) {
            self.log.borrow_mut().push((self.id, 'w')).unwrap();
        }
    }

    struct Silent;
    impl UpdateListener for Silent {}

    #[test]
    fn invoked_in_registration_order() {
        let log = RefCell::new(heapless::Vec::new());
        let first = Recorder { id: 1, log: &log };
        let second = Recorder { id: 2, log: &log };

        let mut listeners: Listeners<'_, 2> = Listeners::new();
        listeners.register(&second).unwrap();
        listeners.register(&first).unwrap();
        listeners.notify_update_available("target");
        listeners.notify_will_update();

        assert_eq!(log.borrow().as_slice(), &[(2, 'a'), (1, 'a'), (2, 'w'), (1, 'w')]);
    }

    #[test]
    fn registration_beyond_capacity_fails() {
        let mut listeners: Listeners<'_, 1> = Listeners::new();
        assert!(listeners.is_empty());
        listeners.register(&Silent).unwrap();
        assert_eq!(listeners.register(&Silent), Err(ListenerError::Full));
        assert_eq!(listeners.len(), 1);
        // default callbacks are no-ops
        listeners.notify_will_update();
    }
}
