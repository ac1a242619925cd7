//! Cancellation eligibility.
//!
//! A booking can be cancelled once none of its coupons are still usable. Open
//! coupons may be voided first when the caller allows it; any other status
//! (flown, exchanged, under airport control) blocks cancellation outright.

use classify::{ClassifiedError, ErrorKind};
use normalize::{CanonicalTicket, CouponStatus};

/// Coupon statuses of a booking's tickets, reduced to what decides cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponStatusSet {
    /// No coupons, or every coupon is void or refunded.
    Settled,
    /// At least one open coupon and no blocking status.
    HasOpen,
    /// At least one status that is neither open, void nor refunded.
    Blocked,
}

impl CouponStatusSet {
    pub fn of(tickets: &[CanonicalTicket]) -> Self {
        let statuses = tickets.iter().flat_map(|t| t.coupons.iter().map(|c| &c.status));
        let mut open = false;
        for status in statuses {
            match status {
                CouponStatus::Other(_) => return CouponStatusSet::Blocked,
                CouponStatus::Open => open = true,
                CouponStatus::Void | CouponStatus::Refunded => {}
            }
        }
        if open {
            CouponStatusSet::HasOpen
        } else {
            CouponStatusSet::Settled
        }
    }
}

/// What the orchestrator does to cancel a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationPlan {
    CancelBooking,
    /// Void these tickets in order, re-fetch the booking, then cancel it.
    VoidThenCancel { tickets: Vec<String> },
}

impl CancellationPlan {
    pub fn decide(
        tickets: &[CanonicalTicket],
        cancel_tickets: bool,
    ) -> Result<Self, ClassifiedError> {
        match CouponStatusSet::of(tickets) {
            CouponStatusSet::Settled => Ok(CancellationPlan::CancelBooking),
            CouponStatusSet::Blocked => Err(ClassifiedError::new(
                ErrorKind::UnableToCancelTicketStatusNotOpen,
                format!("coupon statuses {} block cancellation", blocking_codes(tickets)),
            )),
            CouponStatusSet::HasOpen if !cancel_tickets => Err(ClassifiedError::new(
                ErrorKind::PnrHasOpenTickets,
                format!("tickets {} have open coupons", open_tickets(tickets).join(", ")),
            )),
            CouponStatusSet::HasOpen => Ok(CancellationPlan::VoidThenCancel {
                tickets: open_tickets(tickets),
            }),
        }
    }

    pub fn tickets_to_void(&self) -> &[String] {
        match self {
            CancellationPlan::CancelBooking => &[],
            CancellationPlan::VoidThenCancel { tickets } => tickets,
        }
    }
}

/// Numbers of tickets owning an open coupon, each once, in ticket order.
fn open_tickets(tickets: &[CanonicalTicket]) -> Vec<String> {
    let mut numbers: Vec<String> = Vec::new();
    for ticket in tickets {
        let has_open = ticket.coupons.iter().any(|c| c.status == CouponStatus::Open);
        if has_open && !numbers.contains(&ticket.ticket_number) {
            numbers.push(ticket.ticket_number.clone());
        }
    }
    numbers
}

fn blocking_codes(tickets: &[CanonicalTicket]) -> String {
    let mut codes: Vec<&str> = tickets
        .iter()
        .flat_map(|t| t.coupons.iter())
        .filter(|c| matches!(c.status, CouponStatus::Other(_)))
        .map(|c| c.status.code())
        .collect();
    codes.sort_unstable();
    codes.dedup();
    codes.join(", ")
}
