// Single-writer queue for edit completions.
//
// Engine work (image decoding, text layout) can finish out of order. Every
// edit takes a ticket when it starts; finished edits are released to the
// history strictly in ticket order.

use stamp_core::Document;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, trace};

/// Position of an initiated edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditTicket(u64);

impl EditTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct EditQueue {
    next_ticket: u64,
    next_release: u64,
    // None = abandoned: releases nothing but unblocks later tickets.
    settled: BTreeMap<u64, Option<Document>>,
}

impl EditQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> EditTicket {
        let ticket = EditTicket(self.next_ticket);
        self.next_ticket += 1;
        trace!(ticket = ticket.0, "edit started");
        ticket
    }

    /// Mark `ticket` finished with the scene captured at completion.
    pub fn complete(&mut self, ticket: EditTicket, doc: Document) -> Result<(), QueueError> {
        self.settle(ticket, Some(doc))
    }

    /// Mark `ticket` as producing no history entry.
    pub fn abandon(&mut self, ticket: EditTicket) -> Result<(), QueueError> {
        self.settle(ticket, None)
    }

    fn settle(&mut self, ticket: EditTicket, doc: Option<Document>) -> Result<(), QueueError> {
        if ticket.0 >= self.next_ticket {
            return Err(QueueError::UnknownTicket { ticket: ticket.0 });
        }
        if ticket.0 < self.next_release || self.settled.contains_key(&ticket.0) {
            return Err(QueueError::AlreadySettled { ticket: ticket.0 });
        }

        if ticket.0 != self.next_release {
            debug!(
                ticket = ticket.0,
                waiting_on = self.next_release,
                "edit finished out of order; holding"
            );
        }
        self.settled.insert(ticket.0, doc);
        Ok(())
    }

    /// Settled edits that are next in line, oldest first.
    pub fn drain_ready(&mut self) -> Vec<(EditTicket, Document)> {
        let mut ready = Vec::new();
        while let Some(entry) = self.settled.remove(&self.next_release) {
            if let Some(doc) = entry {
                ready.push((EditTicket(self.next_release), doc));
            }
            self.next_release += 1;
        }
        ready
    }

    /// Edits started but not yet released.
    pub fn pending(&self) -> usize {
        (self.next_ticket - self.next_release) as usize
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("edit ticket {ticket} was never issued")]
    UnknownTicket { ticket: u64 },

    #[error("edit ticket {ticket} was already settled")]
    AlreadySettled { ticket: u64 },
}
