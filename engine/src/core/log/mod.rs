//! Log plumbing for hosts of the decal core.
//!
//! The library itself only talks to the [`log`](https://docs.rs/log) facade. Hosts that want the
//! records (a console, an overlay, a test) install a [`ChannelLogger`] and drain its receiver
//! from their own loop.

mod channel;

pub use channel::{ChannelLogger, LogMessage};
