//! # club-telegram
//!
//! Telegram Bot API adapter.
//!
//! - [`TelegramClient`] implements the [`club_core::GroupMessenger`] capability set
//! - [`UpdatePoller`] long-polls `getUpdates` and turns updates into [`Inbound`] items
//! - [`Inbound`] separates bot commands from membership events

pub mod client;
pub mod error;
pub mod poller;
pub mod types;
pub mod updates;

pub use client::TelegramClient;
pub use error::{TelegramError, TelegramResult};
pub use poller::{PollerConfig, UpdatePoller};
pub use updates::{Command, CommandRequest, Inbound};
