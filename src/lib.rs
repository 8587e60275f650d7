//! ECG segment analysis front end: record loading, reporting and the
//! command-line configuration around [`ecgview_core`].

pub mod canvas;
pub mod config;
pub mod record;
pub mod report;
pub mod run;

pub use config::Cli;
pub use run::{process_record, run, run_all, RunError, RunSummary};
