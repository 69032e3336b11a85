//! Time and expiry rules
//!
//! Every expiry comparison in the system goes through this module; callers
//! pass an explicit `now` (usually from a [`Clock`]) so sweeps and tests are
//! deterministic.

mod clock;
mod expiry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use expiry::{
    compute_renewal, compute_renewal_at, is_active, is_active_at, to_instant, IntoInstant,
    RenewalDuration,
};
