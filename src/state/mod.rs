//! Per-domain state shared by the fetch workers
//!
//! `DomainState` holds the access timestamps the rate limiter uses to space
//! out requests to the same domain.

mod domain_state;

pub use domain_state::DomainState;
