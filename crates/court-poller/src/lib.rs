//! Court availability monitor.
//!
//! Polls the availability API for a rolling window of dates, keeps the slot
//! identities seen in the previous cycle and notifies once per newly
//! available slot through a single configured channel.

pub mod availability_client;
pub mod config;
pub mod error;
pub mod notifier;
pub mod processor;
pub mod scheduler;
pub mod service;
pub mod tracker;
