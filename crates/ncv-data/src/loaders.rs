use std::fs;
use std::path::Path;

use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use csv::ReaderBuilder;
use ncv_types::{DataError, NcvError, NcvResult};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

/// Column-major numeric table as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Self {
        Self { names, columns }
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }
}

/// On-disk formats the loader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Parquet,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> NcvResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" | "pq" => Ok(Self::Parquet),
            _ => Err(DataError::UnsupportedFormat { extension }.into()),
        }
    }
}

/// Loads numeric tables from CSV or Parquet files.
#[derive(Debug, Default)]
pub struct TableLoader;

impl TableLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a table, picking the reader from the file extension.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> NcvResult<Table> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::SourceNotFound(path.display().to_string()).into());
        }
        match DataFormat::from_path(path)? {
            DataFormat::Csv => self.load_csv_file(path),
            DataFormat::Parquet => self.load_parquet_file(path),
        }
    }

    /// Load a CSV file with a header row.
    ///
    /// A leading column with an empty header (R's row names) is dropped.
    pub fn load_csv_file<P: AsRef<Path>>(&self, path: P) -> NcvResult<Table> {
        let path = path.as_ref();
        tracing::info!("Loading CSV table from: {}", path.display());

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to open CSV file {}: {}", path.display(), e),
            })?;

        let headers = rdr
            .headers()
            .map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to read CSV headers: {}", e),
            })?
            .clone();

        let skip_index = headers.get(0).map(str::is_empty).unwrap_or(false) && headers.len() > 1;
        let offset = usize::from(skip_index);
        let names: Vec<String> = headers.iter().skip(offset).map(str::to_string).collect();
        tracing::debug!("CSV headers: {:?}", names);

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to read CSV record at line {}: {}", row + 2, e),
            })?;
            if record.len() != headers.len() {
                return Err(DataError::InvalidFormat {
                    message: format!(
                        "line {} has {} fields, header has {}",
                        row + 2,
                        record.len(),
                        headers.len()
                    ),
                }
                .into());
            }

            for (col, cell) in record.iter().skip(offset).enumerate() {
                columns[col].push(parse_cell(cell, &names[col], row)?);
            }
        }

        let table = Table::new(names, columns);
        tracing::info!(
            "Loaded {} rows x {} columns from CSV file: {}",
            table.n_rows(),
            table.names.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load a Parquet file whose columns are all numeric.
    pub fn load_parquet_file<P: AsRef<Path>>(&self, path: P) -> NcvResult<Table> {
        let path = path.as_ref();
        tracing::info!("Loading Parquet table from: {}", path.display());

        let file = fs::File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| NcvError::Parquet(format!("Failed to open {}: {}", path.display(), e)))?;
        let schema = builder.schema().clone();
        let reader = builder
            .build()
            .map_err(|e| NcvError::Parquet(format!("Failed to build reader for {}: {}", path.display(), e)))?;

        let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        let mut rows_seen = 0usize;

        for batch_result in reader {
            let batch = batch_result.map_err(|e| NcvError::Arrow(format!("Failed to read record batch: {}", e)))?;

            for (col, name) in names.iter().enumerate() {
                let casted = cast(batch.column(col).as_ref(), &DataType::Float64).map_err(|e| {
                    DataError::InvalidFormat {
                        message: format!("Column '{}' is not numeric: {}", name, e),
                    }
                })?;
                let values = casted
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| DataError::InvalidFormat {
                        message: format!("Column '{}' could not be read as float64", name),
                    })?;

                for i in 0..values.len() {
                    if values.is_null(i) {
                        return Err(DataError::MissingValue {
                            column: name.clone(),
                            row: rows_seen + i,
                        }
                        .into());
                    }
                    columns[col].push(values.value(i));
                }
            }
            rows_seen += batch.num_rows();
        }

        let table = Table::new(names, columns);
        tracing::info!(
            "Loaded {} rows x {} columns from Parquet file: {}",
            table.n_rows(),
            table.names.len(),
            path.display()
        );
        Ok(table)
    }
}

fn parse_cell(cell: &str, column: &str, row: usize) -> NcvResult<f64> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan") {
        return Err(DataError::MissingValue {
            column: column.to_string(),
            row,
        }
        .into());
    }
    cell.parse::<f64>().map_err(|e| {
        DataError::ParseError {
            message: format!("Column '{}' row {}: '{}' is not a number: {}", column, row, cell, e),
        }
        .into()
    })
}

/// Write a table as CSV with a header row.
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> NcvResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| DataError::LoadingFailed {
        message: format!("Failed to create CSV file {}: {}", path.display(), e),
    })?;
    let csv_err = |e: csv::Error| DataError::LoadingFailed {
        message: format!("Failed to write {}: {}", path.display(), e),
    };

    writer.write_record(&table.names).map_err(csv_err)?;
    for row in 0..table.n_rows() {
        writer
            .write_record(table.columns.iter().map(|c| c[row].to_string()))
            .map_err(csv_err)?;
    }
    writer.flush()?;
    tracing::info!("Wrote {} rows to {}", table.n_rows(), path.display());
    Ok(())
}
