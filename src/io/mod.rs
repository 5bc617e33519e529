//! Input/output for the CLI boundary.

pub mod output;

pub use output::{create_writer, AnalysisReport, OutputFormat, ReportWriter};
