use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::info;

use crate::error::ScraperError;
use crate::listing::{JobRecord, OUTPUT_COLUMNS};

/// Excelで文字化けしないようにBOMを付ける
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// BOM付きUTF-8 CSVへの書き出し
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    crawl_date: String,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, crawl_date: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            crawl_date: crawl_date.into(),
        }
    }

    /// 全レコードを書き出して出力先を返す
    pub fn write_table(&self, rows: &[JobRecord]) -> Result<PathBuf, ScraperError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = BufWriter::new(File::create(&self.path)?);
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(OUTPUT_COLUMNS)?;
        for row in rows {
            writer.write_record(row.to_row(&self.crawl_date))?;
        }
        writer.flush()?;

        info!("Wrote {} rows to {:?}", rows.len(), self.path);
        Ok(self.path.clone())
    }
}
