//! The ingestion-dedup-forward pipeline.
//!
//! A run is a [`Checker`] pass over every configured channel followed by a
//! [`Forwarder`] flush of the backlog. Transports and the store are injected,
//! so the same pipeline runs against Telegram in production and fakes in
//! tests.

pub mod check;
pub mod error;
pub mod forward;
pub mod relay;
pub mod resolver;

#[cfg(test)]
mod fakes;

pub use {
    check::{ChannelReport, CheckReport, Checker, SkipReason, SkippedChannel},
    error::{Error, Result},
    forward::{FlushReport, Forwarder, format_message},
    relay::{Relay, RunReport},
    resolver::CachedResolver,
};
