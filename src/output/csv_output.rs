//! CSV artifact sink
//!
//! Writes retained articles as UTF-8 CSV rows under a timestamped file name,
//! one file per crawl run.

use crate::output::traits::{Article, ArticleSink, OutputResult};
use chrono::Utc;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Column header of every artifact
pub const ARTIFACT_HEADER: [&str; 4] = ["Title", "Link", "Published", "Content"];

/// Builds the artifact path for a run: `<dir>/<site>_articles_<unix_ts>.csv`
pub fn artifact_path(dir: &Path, site_label: &str) -> PathBuf {
    dir.join(format!(
        "{}_articles_{}.csv",
        site_label,
        Utc::now().timestamp()
    ))
}

/// CSV-backed artifact sink
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvSink {
    /// Creates the artifact file and writes the header row
    ///
    /// # Arguments
    ///
    /// * `dir` - Output directory; must already exist
    /// * `site_label` - Artifact name prefix
    pub fn create(dir: &Path, site_label: &str) -> OutputResult<Self> {
        let path = artifact_path(dir, site_label);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(ARTIFACT_HEADER)?;
        Ok(Self { writer, path })
    }

    /// Path of the artifact being written
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArticleSink for CsvSink {
    fn write_article(&mut self, article: &Article) -> OutputResult<()> {
        self.writer.write_record([
            article.title.as_str(),
            article.link.as_str(),
            article.published.as_str(),
            article.content.as_str(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
