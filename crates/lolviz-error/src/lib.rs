//! # lolviz-error
//!
//! Unified error handling for lolviz.
//!
//! - **ErrorKind**: what went wrong (a caller defect such as a failing accessor,
//!   a malformed input document, or a layout engine failure)
//! - **Error context**: the operation that failed plus key/value breadcrumbs
//! - **Error source**: the wrapped underlying error, if any
//!
//! ```rust
//! use lolviz_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::AccessorFailed, "next accessor failed")
//!         .with_operation("viz::llistviz")
//!         .with_context("accessor", "next"))
//! }
//! ```
//!
//! Shape problems in the visualised data are never errors: unknown values fall
//! back to an opaque leaf, cycles are cut by the visited set, long strings and
//! collections are elided. Only caller configuration defects and backend
//! failures cross the boundary as `Error`.

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using lolviz Error
pub type Result<T> = std::result::Result<T, Error>;
