//! Render-side handle over the shared state.
//!
//! A [`ViewerSession`] owns the viewport and exposes the front-end commands.
//! It lives on the render thread; only the [`StateStore`] is shared.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::coord::Viewport;
use crate::state::{Snapshot, StateStore};

/// Front-end commands and the per-frame read.
#[derive(Debug)]
pub struct ViewerSession {
    store: Arc<StateStore>,
    viewport: Viewport,
}

impl ViewerSession {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self::with_viewport(store, Viewport::default())
    }

    pub fn with_viewport(store: Arc<StateStore>, viewport: Viewport) -> Self {
        Self { store, viewport }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Recenter the map on the default position.
    pub fn reset_view(&mut self) {
        self.viewport.reset();
        debug!("View reset");
    }

    /// Flip animation drawing; returns the new flag.
    pub fn toggle_animations(&self) -> bool {
        let enabled = self.store.toggle_animations();
        debug!(enabled, "Animations toggled");
        enabled
    }

    /// Select the node under a click, clearing the selection on a miss.
    pub fn select_node_at(&self, x: i32, y: i32) -> Option<usize> {
        self.store.select_node_at(&self.viewport, x, y)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.resize(width, height);
    }

    /// Sweep expired animations and copy the state for drawing.
    pub fn frame(&self, now: Instant) -> Snapshot {
        self.store.sweep_and_snapshot(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GeoPoint;
    use crate::node::Node;

    #[test]
    fn test_reset_view_keeps_size() {
        let store = Arc::new(StateStore::new());
        let viewport = Viewport::new(GeoPoint { lat: 10.0, lon: 20.0 }, 10, 800, 600);
        let mut session = ViewerSession::with_viewport(store, viewport);

        session.reset_view();
        assert_eq!(session.viewport().center(), Viewport::default().center());
        assert_eq!(session.viewport().size(), (800, 600));
    }

    #[test]
    fn test_commands_reach_shared_store() {
        let store = Arc::new(StateStore::new());
        let session = ViewerSession::new(Arc::clone(&store));

        assert!(!session.toggle_animations());
        assert!(!store.snapshot().animations_enabled);

        let center = session.viewport().center();
        store.replace_nodes(vec![Node {
            id: 9,
            hash: 1,
            position: Some(center),
            ..Node::default()
        }]);
        let (x, y) = session.viewport().geo_to_screen(center);
        assert_eq!(session.select_node_at(x as i32, y as i32), Some(0));
        assert_eq!(
            session.frame(Instant::now()).selected_node().map(|n| n.id),
            Some(9)
        );
    }
}
