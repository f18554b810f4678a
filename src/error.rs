//! Command-Line Error Types

use derive_more::{Display, Error};

/// A command-line error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for command-line operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Configuration could not be loaded or is invalid.
    #[display("configuration error")]
    Config,
    /// The selection doesn't fit the chosen category (the file picker's job).
    #[display("invalid selection: {_0}")]
    Selection(#[error(not(source))] String),
    /// Access provider or backup store could not be set up.
    #[display("cannot set up pipeline")]
    Setup,
    /// The run could not be started.
    #[display("cannot start run")]
    Start,
}

/// The error followed by every cause beneath it, outermost first.
pub fn report(err: &Error) -> String {
    fn walk(frame: &exn::Frame, causes: &mut Vec<String>) {
        causes.push(frame.to_string());
        for child in frame.children() {
            walk(child, causes);
        }
    }
    let mut causes = Vec::new();
    walk(err.frame(), &mut causes);
    causes.join(": ")
}
