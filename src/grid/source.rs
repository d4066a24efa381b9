//! Data source boundary.
//!
//! The grid asks for rows with a [`FetchTicket`] and the host answers by
//! handing the ticket back with the rows. Tickets from before the latest
//! reload or reset are stale and their rows are dropped.

/// Epoch token attached to a data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FetchTicket {
    pub epoch: u64,
}

impl FetchTicket {
    pub fn new(epoch: u64) -> Self {
        Self { epoch }
    }
}

/// Something that can be asked to produce rows.
///
/// Implementations answer later (or immediately) through
/// `GridController::receive` with the same ticket.
pub trait DataSource {
    fn request(&mut self, ticket: FetchTicket);
}

impl<F: FnMut(FetchTicket)> DataSource for F {
    fn request(&mut self, ticket: FetchTicket) {
        self(ticket);
    }
}

/// What became of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Rows were applied; carries the visible row count afterwards
    Applied(usize),
    /// The ticket predates the current epoch
    Stale,
}

/// Request lifecycle of the current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchState {
    NotRequested,
    Pending(FetchTicket),
    Loaded,
}
