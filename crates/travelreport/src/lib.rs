//! `travelreport` - Traveler complaint reports for travel agents
//!
//! This library provides the report form, the traveler and agent signature
//! pads, the persisted report store and the PDF and CSV exporters behind the
//! `tareport` command-line tool.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod form;
pub mod logging;
pub mod report;
pub mod session;
pub mod signature;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use export::Exporter;
pub use form::{Draft, Field};
pub use logging::init_logging;
pub use report::{ProblemType, Report, ReportFields};
pub use session::{Session, View};
pub use signature::{SignatureImage, SignaturePad, SignaturePads, SignatureRole};
pub use storage::Storage;
pub use store::{LoadState, RemoveOutcome, ReportStore};
