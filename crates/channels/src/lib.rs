//! Transport capabilities consumed by the relay.
//!
//! The source side resolves channel handles and lists recent post ids; the
//! destination side delivers text into a thread of a group. Concrete
//! transports (Telegram) live in their own crates.

pub mod destination;
pub mod error;
pub mod source;

pub use {
    destination::MessageSink,
    error::{Error, Result},
    source::{IdentityResolver, ListingFetcher},
};
