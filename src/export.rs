// src/export.rs

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{
    array::{Array, ArrayRef, StringArray, TimestampMicrosecondArray},
    datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::DateTime;
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    errors::ParquetError,
    file::properties::WriterProperties,
};
use tracing::{debug, info, instrument};

use crate::error::ExportError;
use crate::periods::{PeriodRow, PeriodTable};

pub const DEFAULT_OUTPUT_PATH: &str = "ipca_periodos.parquet";

pub const COL_PERIOD: &str = "Período";
pub const COL_CODE: &str = "Código";
pub const COL_RELEASED_AT: &str = "Data de Liberação";

/// Output schema, in column order. No index column.
pub fn period_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(COL_PERIOD, DataType::Utf8, false),
        Field::new(COL_CODE, DataType::Utf8, true),
        Field::new(
            COL_RELEASED_AT,
            DataType::Timestamp(TimeUnit::Microsecond, None),
            false,
        ),
    ]))
}

fn to_batch(table: &PeriodTable) -> Result<RecordBatch, ExportError> {
    let periods: ArrayRef = Arc::new(StringArray::from_iter_values(
        table.iter().map(|r| r.period.as_str()),
    ));
    let codes: ArrayRef = Arc::new(StringArray::from(
        table.iter().map(|r| r.code.as_deref()).collect::<Vec<_>>(),
    ));
    let released: ArrayRef = Arc::new(TimestampMicrosecondArray::from_iter_values(
        table.iter().map(|r| r.released_at.and_utc().timestamp_micros()),
    ));

    Ok(RecordBatch::try_new(
        period_schema(),
        vec![periods, codes, released],
    )?)
}

fn tmp_path_for(path: &Path) -> Result<PathBuf, ExportError> {
    let name = path.file_name().ok_or_else(|| {
        ExportError::fs(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    Ok(path.with_file_name(format!(".{}.tmp", name.to_string_lossy())))
}

/// Disk-level failures surfaced by the parquet writer are filesystem errors.
fn classify(tmp: &Path, err: ParquetError) -> ExportError {
    match err {
        ParquetError::External(inner) => match inner.downcast::<std::io::Error>() {
            Ok(io) => ExportError::fs(tmp, *io),
            Err(other) => ExportError::Parquet(ParquetError::External(other)),
        },
        other => ExportError::Parquet(other),
    }
}

fn write_parquet(table: &PeriodTable, tmp: &Path) -> Result<(), ExportError> {
    let file = File::create(tmp).map_err(|e| ExportError::fs(tmp, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), period_schema(), Some(props))
        .map_err(|e| classify(tmp, e))?;

    // an empty table still gets a footer with the full schema
    if !table.is_empty() {
        writer
            .write(&to_batch(table)?)
            .map_err(|e| classify(tmp, e))?;
    }
    let buffered = writer.into_inner().map_err(|e| classify(tmp, e))?;
    buffered
        .into_inner()
        .map_err(|e| ExportError::fs(tmp, e.into_error()))?;
    Ok(())
}

/// Write `table` to `path` as Parquet, replacing whatever is there.
///
/// The file is written beside the target and renamed into place, so a
/// reader never sees a half-written file. The temp file is removed on any
/// failure.
#[instrument(level = "debug", skip(table), fields(rows = table.len(), path = %path.display()))]
pub fn export_table(table: &PeriodTable, path: &Path) -> Result<(), ExportError> {
    let tmp = tmp_path_for(path)?;

    if let Err(e) = write_parquet(table, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    debug!(tmp = %tmp.display(), "wrote temp file");

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ExportError::fs(path, e)
    })?;

    info!("exported file: {}", path.display());
    Ok(())
}

fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a T, ExportError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| ExportError::Schema(format!("missing or mistyped column {:?}", name)))
}

/// Read an exported file back into rows.
pub fn read_period_table(path: &Path) -> Result<PeriodTable, ExportError> {
    let file = File::open(path).map_err(|e| ExportError::fs(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(1024)
        .build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let periods = column::<StringArray>(&batch, COL_PERIOD)?;
        let codes = column::<StringArray>(&batch, COL_CODE)?;
        let released = column::<TimestampMicrosecondArray>(&batch, COL_RELEASED_AT)?;

        for i in 0..batch.num_rows() {
            let micros = released.value(i);
            let released_at = DateTime::from_timestamp_micros(micros)
                .ok_or_else(|| ExportError::Schema(format!("timestamp out of range: {}", micros)))?
                .naive_utc();
            rows.push(PeriodRow {
                period: periods.value(i).to_string(),
                code: (!codes.is_null(i)).then(|| codes.value(i).to_string()),
                released_at,
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::tempdir;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn sample() -> PeriodTable {
        vec![
            PeriodRow {
                period: "janeiro 2024".into(),
                code: Some("202401".into()),
                released_at: ts("2024-02-08T09:00:00"),
            },
            PeriodRow {
                period: "fevereiro 2024".into(),
                code: None,
                released_at: ts("2024-03-12T09:00:00"),
            },
            PeriodRow {
                period: "março 2024".into(),
                code: Some("202403".into()),
                released_at: ts("2024-04-10T09:00:00"),
            },
        ]
    }

    #[test]
    fn round_trips_rows_in_order() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("ipca_periodos.parquet");

        export_table(&sample(), &path).unwrap();
        assert_eq!(read_period_table(&path).unwrap(), sample());
        assert!(!tmp.path().join(".ipca_periodos.parquet.tmp").exists());
    }

    #[test]
    fn empty_table_writes_schema_only_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("empty.parquet");

        export_table(&Vec::new(), &path).unwrap();

        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap()).unwrap();
        let names: Vec<_> = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, vec![COL_PERIOD, COL_CODE, COL_RELEASED_AT]);
        assert_eq!(
            builder.schema().field(2).data_type(),
            &DataType::Timestamp(TimeUnit::Microsecond, None)
        );
        assert_eq!(builder.metadata().file_metadata().num_rows(), 0);
        assert!(read_period_table(&path).unwrap().is_empty());
    }

    #[test]
    fn overwrites_existing_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("out.parquet");
        fs::write(&path, b"stale").unwrap();

        let rows = sample()[..1].to_vec();
        export_table(&rows, &path).unwrap();
        assert_eq!(read_period_table(&path).unwrap(), rows);
    }

    #[test]
    fn unwritable_destination_is_filesystem_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("no_such_dir").join("out.parquet");
        match export_table(&sample(), &path) {
            Err(ExportError::Filesystem { .. }) => {}
            other => panic!("expected Filesystem error, got {:?}", other),
        }
        assert!(!path.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_disk_is_filesystem_error_and_cleans_up() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("out.parquet");
        let staging = tmp.path().join(".out.parquet.tmp");
        std::os::unix::fs::symlink("/dev/full", &staging).unwrap();

        match export_table(&sample()[..1].to_vec(), &path) {
            Err(ExportError::Filesystem { source, .. }) => {
                assert_eq!(source.raw_os_error(), Some(28))
            }
            other => panic!("expected Filesystem error, got {:?}", other),
        }
        assert!(fs::symlink_metadata(&staging).is_err());
        assert!(!path.exists());
    }
}
