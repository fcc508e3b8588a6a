use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::models::TraderSummary;
use tracing::{debug, warn};

/// Generation of one registry cycle, handed out when the cycle starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CycleTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A newer cycle already committed, or an optimistic delete happened while this one was in flight.
    Stale,
}

/// The authoritative set of trader summaries, in listing order.
///
/// Entries are only ever replaced wholesale by a committed cycle; the one local edit is the
/// optimistic removal on delete. A trader being deleted stays hidden from every commit until
/// its delete resolves, and the first cycle issued after that reconciles it.
#[derive(Debug, Default)]
pub struct TraderRegistry {
    traders: Vec<TraderSummary>,
    issued: u64,
    committed: u64,
    invalidated_through: u64,
    /// Deletes whose backend request is still in flight.
    deleting: HashSet<String>,
    /// Deletes the backend confirmed; the next commit checks they really went away.
    confirmed_deletes: HashSet<String>,
    banner: Option<String>,
    loaded: bool,
    last_refreshed: Option<DateTime<Utc>>,
}

impl TraderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traders(&self) -> &[TraderSummary] {
        &self.traders
    }

    pub fn get(&self, trader_id: &str) -> Option<&TraderSummary> {
        self.traders.iter().find(|t| t.trader_id == trader_id)
    }

    pub fn contains(&self, trader_id: &str) -> bool {
        self.get(trader_id).is_some()
    }

    pub fn ids(&self) -> Vec<String> {
        self.traders.iter().map(|t| t.trader_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.traders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traders.is_empty()
    }

    /// User-visible message left by the latest failed listing, cleared by the next success.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn has_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    pub fn begin_cycle(&mut self) -> CycleTicket {
        self.issued += 1;
        CycleTicket(self.issued)
    }

    fn accepts(&self, ticket: CycleTicket) -> bool {
        ticket.0 > self.committed && ticket.0 > self.invalidated_through
    }

    pub fn commit(
        &mut self,
        ticket: CycleTicket,
        mut traders: Vec<TraderSummary>,
    ) -> CommitOutcome {
        if !self.accepts(ticket) {
            debug!(
                "Discarding registry cycle {} (committed {}, invalidated through {})",
                ticket.0, self.committed, self.invalidated_through
            );
            return CommitOutcome::Stale;
        }

        for trader_id in self.confirmed_deletes.drain() {
            if traders.iter().any(|t| t.trader_id == trader_id) {
                warn!(
                    "Backend still lists trader {} after delete; restoring it",
                    trader_id
                );
            }
        }
        if !self.deleting.is_empty() {
            traders.retain(|t| !self.deleting.contains(&t.trader_id));
        }

        self.traders = traders;
        self.committed = ticket.0;
        self.banner = None;
        self.loaded = true;
        self.last_refreshed = Some(Utc::now());
        CommitOutcome::Committed
    }

    /// Records a failed listing. The previous set stays visible.
    pub fn fail(&mut self, ticket: CycleTicket, message: String) -> CommitOutcome {
        if !self.accepts(ticket) {
            return CommitOutcome::Stale;
        }
        self.committed = ticket.0;
        self.banner = Some(message);
        CommitOutcome::Committed
    }

    /// Tentatively drops a trader ahead of the backend confirming it. Cycles already in
    /// flight were issued before the delete and can no longer commit; cycles issued while
    /// the delete is pending commit without it.
    pub fn remove_optimistic(&mut self, trader_id: &str) -> bool {
        self.invalidated_through = self.issued;
        self.deleting.insert(trader_id.to_string());

        let before = self.traders.len();
        self.traders.retain(|t| t.trader_id != trader_id);
        self.traders.len() != before
    }

    /// Ends the pending state of a delete once the backend has answered. Cycles issued while
    /// it was pending can no longer commit, so the next cycle decides whether the trader is
    /// really gone.
    pub fn finish_delete(&mut self, trader_id: &str, confirmed: bool) {
        self.invalidated_through = self.issued;
        self.deleting.remove(trader_id);
        if confirmed {
            self.confirmed_deletes.insert(trader_id.to_string());
        }
    }

    pub fn is_deleting(&self, trader_id: &str) -> bool {
        self.deleting.contains(trader_id)
    }
}
