//! Comparison of two event snapshots.

mod attendee_diff;
mod invite_data;

pub use attendee_diff::AttendeeDiff;
pub(crate) use attendee_diff::canonical_set;
pub use invite_data::{InviteDataComparator, InviteFieldComparator};
