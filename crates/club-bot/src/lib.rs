//! # club-bot
//!
//! Long-running worker around the Telegram bot:
//!
//! - answers `/start`, `/check`, `/help` and `/id` in private chats
//! - arbitrates join requests and arrivals in the community groups
//! - runs the expiry, removal-retry, warning and status-report sweeps

pub mod dispatcher;
pub mod handlers;
pub mod scheduler;
pub mod worker;

pub use dispatcher::Dispatcher;
pub use scheduler::{spawn_periodic, spawn_sweeps, SweepIntervals};
pub use worker::{create_service_context, run};
