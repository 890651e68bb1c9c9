//! Structural diff engine for signature trees.
//!
//! [`validate`] compares a freshly built *candidate* tree against a stored
//! *baseline* and returns `None` when they are structurally equal, or an
//! [`ErrorReport`] pinpointing every drifted member otherwise.
//!
//! # Example
//!
//! ```rust,ignore
//! use apisnap_core::differ::validate;
//!
//! if let Some(report) = validate(&candidate, &baseline) {
//!     for entry in report.entries() {
//!         println!("{}: {}", entry.path, entry.description);
//!     }
//! }
//! ```

pub mod report;
pub mod validator;

pub use report::{ChangeCategory, ErrorReport, ReportEntry, ReportSummary};
pub use validator::{structurally_equal, validate};
