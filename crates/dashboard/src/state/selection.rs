use std::sync::{Mutex, PoisonError};

use common::models::TraderSummary;
use tokio::sync::watch;
use tracing::debug;

/// The currently selected trader id, broadcast to whoever renders or aggregates for it.
///
/// Subscribers are only woken when the id actually changes, so re-selecting the same trader
/// does not restart its analytics.
pub struct SelectionModel {
    tx: watch::Sender<Option<String>>,
    /// Id to select as soon as a committed registry cycle lists it (set by create).
    preferred: Mutex<Option<String>>,
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionModel {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(None),
            preferred: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    /// Returns whether the selection changed.
    pub fn select(&self, trader_id: Option<String>) -> bool {
        self.set_preferred(None);
        self.set(trader_id)
    }

    pub fn prefer(&self, trader_id: String) {
        self.set_preferred(Some(trader_id));
    }

    fn set_preferred(&self, trader_id: Option<String>) {
        *self.preferred.lock().unwrap_or_else(PoisonError::into_inner) = trader_id;
    }

    fn set(&self, trader_id: Option<String>) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == trader_id {
                return false;
            }
            debug!("Selection {:?} -> {:?}", current, trader_id);
            *current = trader_id;
            true
        })
    }

    /// Brings the selection in line with a freshly committed trader set.
    pub fn reconcile(&self, traders: &[TraderSummary]) {
        let contains = |id: &str| traders.iter().any(|t| t.trader_id == id);

        let preferred = {
            let mut preferred = self.preferred.lock().unwrap_or_else(PoisonError::into_inner);
            if preferred.as_deref().is_some_and(contains) {
                preferred.take()
            } else {
                None
            }
        };
        if let Some(id) = preferred {
            self.set(Some(id));
            return;
        }

        let still_listed = self.tx.borrow().as_deref().is_some_and(contains);
        if !still_listed {
            self.set(traders.first().map(|t| t.trader_id.clone()));
        }
    }

    /// Moves the selection off a trader that was just removed locally.
    pub fn on_removed(&self, trader_id: &str, remaining: &[TraderSummary]) {
        if self.tx.borrow().as_deref() == Some(trader_id) {
            self.set(remaining.first().map(|t| t.trader_id.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::registry::tests::summary;

    fn listed(ids: &[&str]) -> Vec<TraderSummary> {
        ids.iter().map(|id| summary(id)).collect()
    }

    #[test]
    fn test_first_listing_selects_first_trader() {
        let selection = SelectionModel::new();
        selection.reconcile(&listed(&["b", "a"]));
        assert_eq!(selection.current().as_deref(), Some("b"));
    }

    #[test]
    fn test_valid_selection_is_kept() {
        let selection = SelectionModel::new();
        selection.select(Some("a".to_string()));
        selection.reconcile(&listed(&["b", "a"]));
        assert_eq!(selection.current().as_deref(), Some("a"));
    }

    #[test]
    fn test_vanished_selection_moves_or_clears() {
        let selection = SelectionModel::new();
        selection.select(Some("a".to_string()));

        selection.reconcile(&listed(&["c"]));
        assert_eq!(selection.current().as_deref(), Some("c"));

        selection.reconcile(&[]);
        assert_eq!(selection.current(), None);
    }

    #[test]
    fn test_preferred_waits_until_listed() {
        let selection = SelectionModel::new();
        selection.reconcile(&listed(&["a"]));
        selection.prefer("new".to_string());

        selection.reconcile(&listed(&["a"]));
        assert_eq!(selection.current().as_deref(), Some("a"));

        selection.reconcile(&listed(&["a", "new"]));
        assert_eq!(selection.current().as_deref(), Some("new"));

        // Consumed: later cycles treat it like any other selection.
        selection.select(Some("a".to_string()));
        selection.reconcile(&listed(&["a", "new"]));
        assert_eq!(selection.current().as_deref(), Some("a"));
    }

    #[test]
    fn test_subscribers_only_wake_on_change() {
        let selection = SelectionModel::new();
        let mut rx = selection.subscribe();

        assert!(selection.select(Some("a".to_string())));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        assert!(!selection.select(Some("a".to_string())));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_removing_selected_trader() {
        let selection = SelectionModel::new();
        selection.select(Some("a".to_string()));

        selection.on_removed("b", &listed(&["a"]));
        assert_eq!(selection.current().as_deref(), Some("a"));

        selection.on_removed("a", &[]);
        assert_eq!(selection.current(), None);
    }
}
