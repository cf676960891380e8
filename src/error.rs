use std::error;
use std::fmt;

/**
 * Error to represent an unrecoverable breakdown of the hydro state. Both
 * variants mean the run is physically invalid beyond the current cycle:
 * there is no retry or rollback, the driver is expected to terminate the
 * process with the matching status code.
 */
#[derive(Debug)]
pub enum Error {
    /// An element's relative volume went non-positive (mesh tangling or
    /// inversion). Carries the index of an offending element.
    Volume { elem: usize },

    /// An element's artificial viscosity exceeded the configured qstop
    /// bound after the monotonic-Q pass.
    QStop { elem: usize, q: f64 },
}

impl Error {
    /// The process exit status documented for each failure kind.
    pub fn status(&self) -> i32 {
        match self {
            Error::Volume { .. } => -1,
            Error::QStop { .. } => -2,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::Volume { elem } => {
                writeln!(fmt, "non-positive relative volume in element {}", elem)
            }
            Error::QStop { elem, q } => {
                writeln!(fmt, "artificial viscosity {} exceeds qstop in element {}", q, elem)
            }
        }
    }
}

impl error::Error for Error {}
