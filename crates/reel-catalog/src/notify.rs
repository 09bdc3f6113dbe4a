//! Change notification hook.
//!
//! The catalog calls [`ChangeNotifier::notify`] after a write has been
//! committed, never before. Delivery is fire-and-forget: a notifier must not
//! block and cannot fail the operation that triggered it.

use reel_types::ChangeEvent;

/// Receives record change events after commit.
pub trait ChangeNotifier: Send + Sync {
    /// Announce a committed change.
    fn notify(&self, event: ChangeEvent);
}

/// Notifier that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn notify(&self, _event: ChangeEvent) {}
}
