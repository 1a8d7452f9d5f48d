use std::fmt::Debug;
use thiserror::Error;

use crate::lines::Pad;

/// Failures the link can report.
///
/// A pad that is unplugged or out of sync is *not* an error: it yields
/// frames of indeterminate content. Only host-side faults and wiring
/// preconditions surface here.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error<E: Debug> {
    /// Driving or sampling one of the host's lines failed.
    #[error("line I/O failed: {0:?}")]
    Line(E),

    /// The pad has no attention line assigned, so it cannot be addressed.
    #[error("no attention line wired for {0}")]
    PadNotWired(Pad),
}

impl<E: Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Line(e)
    }
}
