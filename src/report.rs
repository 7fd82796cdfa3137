use std::{io, path::Path};

use serde::Serialize;

use crate::{
    compare::Comparison,
    error::{Error, Result},
};

/// One line of the per-cell difference report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub instance: String,
    /// Canonical `"(x, y)"` label, bottom-up
    pub cell: String,
    pub exact_vs_model_based: f64,
    pub exact_vs_model_free: f64,
    pub model_based_vs_model_free: f64,
}

/// Flatten a comparison into one row per cell
pub fn rows(instance: &str, comparison: &Comparison) -> Vec<Row> {
    comparison
        .cells
        .iter()
        .map(|c| Row {
            instance: instance.to_owned(),
            cell: c.label(),
            exact_vs_model_based: c.diff.exact_vs_model_based,
            exact_vs_model_free: c.diff.exact_vs_model_free,
            model_based_vs_model_free: c.diff.model_based_vs_model_free,
        })
        .collect()
}

/// Write rows as CSV, header first
pub fn write_csv<W: io::Write>(writer: W, rows: &[Row]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()
        .map_err(|e| Error::io("flush csv report", e))
}

pub fn write_csv_file(path: impl AsRef<Path>, rows: &[Row]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .map_err(|e| Error::io(format!("create {}", path.display()), e))?;
    write_csv(io::BufWriter::new(file), rows)
}
