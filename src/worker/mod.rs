//! Background work.
//!
//! - [`poll`]: the vote-resolution poller, run as one spawned task

mod poll;

pub use poll::{PollSummary, Poller};
