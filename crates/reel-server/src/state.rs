//! Shared application state for the catalog API.
//!
//! [`AppState`] owns the [`Catalog`] and the broadcast channel that carries
//! record change events to `WebSocket` subscribers. The catalog publishes
//! into the channel through [`BroadcastNotifier`] after each commit.

use reel_catalog::{Catalog, CatalogStore, ChangeNotifier, ImportSettings};
use reel_types::ChangeEvent;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for change events.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// Forwards catalog change events into a broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastNotifier {
    /// Wrap a broadcast sender.
    pub const fn new(tx: broadcast::Sender<ChangeEvent>) -> Self {
        Self { tx }
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn notify(&self, event: ChangeEvent) {
        // send returns Err only when there are zero receivers,
        // which is normal when no WebSocket clients are connected.
        let delivered = self.tx.send(event).unwrap_or(0);
        tracing::trace!(kind = %event.kind, id = %event.id, delivered, "change event published");
    }
}

/// Shared state for the Axum application, injected via `State`.
pub struct AppState<S> {
    /// The catalog service.
    pub catalog: Catalog<S>,
    /// Broadcast sender for change events.
    pub tx: broadcast::Sender<ChangeEvent>,
    /// Username recorded for imports that name none.
    pub default_user: String,
}

impl<S: CatalogStore> AppState<S> {
    /// Build the catalog over `store` and wire its change events into a
    /// fresh broadcast channel.
    pub fn new(store: S, settings: ImportSettings, default_user: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let notifier = std::sync::Arc::new(BroadcastNotifier::new(tx.clone()));
        let catalog = Catalog::new(store)
            .with_notifier(notifier)
            .with_settings(settings);
        Self {
            catalog,
            tx,
            default_user: default_user.into(),
        }
    }

    /// Subscribe to the change event channel.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}
