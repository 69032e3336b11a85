//! Inbound events from the messaging platform

mod membership_event;

pub use membership_event::MembershipEvent;
