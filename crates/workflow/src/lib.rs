//! Multi-step booking workflows over a vendor transport.
//!
//! [`Orchestrator`] turns one caller request into the sequence of vendor
//! requests and terminal commands it takes, deciding each next step from the
//! classified outcome of the last one:
//!
//! - [`Orchestrator::ticket`] issues tickets, recovering once from FOID and
//!   PNR-busy rejections ([`TicketingMachine`]);
//! - [`Orchestrator::cancel`] checks coupon statuses before cancelling, voiding
//!   open tickets on request ([`CancellationPlan`]);
//! - [`Orchestrator::import_pnr`] makes a record importable through the
//!   terminal ([`ImportMachine`]); [`Orchestrator::get_booking`] falls back to
//!   it automatically;
//! - [`Orchestrator::get_ticket`] resolves duplicate and incomplete ticket
//!   answers;
//! - [`Orchestrator::create_booking`] cancels the partial record a failed sell
//!   leaves behind;
//! - [`Orchestrator::search_bookings`] lists universal records.
//!
//! The state machines only decide; they can be driven with synthetic results
//! in tests and never touch the collaborators themselves.
//!
//! ## Observability
//!
//! Each workflow runs in a `workflow.<name>` span, logs `workflow_success` or
//! `workflow_failure` when it returns and reports to the recorder installed
//! with [`set_workflow_metrics`].

mod cancel;
mod config;
mod error;
mod import;
mod metrics;
mod orchestrator;
mod ticketing;
mod transport;

pub use crate::cancel::{CancellationPlan, CouponStatusSet};
pub use crate::config::{ConfigError, ImportConfig, TicketingPolicy, WorkflowConfig};
pub use crate::error::{TerminalError, TransportError};
pub use crate::import::{ImportMachine, ImportStage, ImportState, ImportStep, IMPORT_RETRIEVALS};
pub use crate::metrics::{set_workflow_metrics, WorkflowMetrics, WorkflowRun};
pub use crate::orchestrator::Orchestrator;
pub use crate::ticketing::{TicketingEvent, TicketingMachine, TicketingState};
pub use crate::transport::{Operation, TerminalFactory, TerminalSession, Transport};
