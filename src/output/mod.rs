//! Output module for crawl artifacts
//!
//! This module defines the sink interface the crawl engine writes through and
//! the CSV implementation that produces the artifact files scheduled for
//! later cleanup.

mod csv_output;
mod traits;

pub use csv_output::{artifact_path, CsvSink, ARTIFACT_HEADER};
pub use traits::{Article, ArticleSink, OutputError, OutputResult};
