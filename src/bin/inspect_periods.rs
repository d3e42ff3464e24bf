use anyhow::{Context, Result};
use ipcascraper::read_period_table;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{env, fs::File, path::Path, process::exit};

fn main() -> Result<()> {
    // Expect exactly one CLI argument: path to an exported Parquet file.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!(
            "Usage: {} <PARQUET_FILE>",
            args.first().map_or("inspect_periods", String::as_str)
        );
        exit(1);
    }
    inspect(Path::new(&args[1]))
}

/// Print file metadata, the column layout, then every row.
fn inspect(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = SerializedFileReader::new(file)?;
    let file_meta = reader.metadata().file_metadata();

    println!("=== Parquet File: {} ===", path.display());
    println!(
        "Created by:           {}",
        file_meta.created_by().unwrap_or("<unknown>")
    );
    println!("Total rows:           {}", file_meta.num_rows());
    println!(
        "Number of row groups: {}",
        reader.metadata().num_row_groups()
    );
    println!();

    println!("=== Columns ===");
    for col in file_meta.schema_descr().columns() {
        let logical = col
            .logical_type()
            .as_ref()
            .map_or("<none>".to_string(), |lt| format!("{:?}", lt));
        println!(
            "- {:<20} | Physical: {:<10} | Logical: {}",
            col.name(),
            format!("{:?}", col.physical_type()),
            logical
        );
    }
    println!();

    println!("=== Rows ===");
    for row in read_period_table(path)? {
        println!(
            "{:<20} {:<8} {}",
            row.period,
            row.code.as_deref().unwrap_or("-"),
            row.released_at
        );
    }
    Ok(())
}
