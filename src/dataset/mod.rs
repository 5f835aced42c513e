//! Tabular data for the experiment.
//!
//! A [`Table`] is an ordered list of columns plus rows of [`Record`]s. The
//! text lives in one column (`response` by default) and every label is a 0/1
//! number column. Predicted columns (`pay_bert`, `pay_llm`, ...) are merged
//! back in with [`Table::append_labels`] so originals and predictions sit side
//! by side for [`compare`](crate::compare).

pub mod tokenize;

use crate::error::{PipelineError, Result};
use crate::pipelines::labeling::{Batch, BatchLabels};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

/// Default number of rows in the training split.
pub const DEFAULT_TRAIN_ROWS: usize = 1_000;

// ============ Field / Record ============

/// One cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    /// Numeric cell, such as a predicted 0/1 label.
    Number(f64),
    /// Raw cell text, kept verbatim. CSV cells always load as text.
    Text(String),
}

impl Field {
    /// The numeric value, if any.
    ///
    /// Text that parses as a finite number counts, so CSV label cells like
    /// `"1"` read as `1.0` while the original string is preserved.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Field::Number(value) => Some(*value),
            Field::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
        }
    }

    /// The text value, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Field::Text(text) => Some(text),
            Field::Number(_) => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Number(value) => write!(f, "{value}"),
            Field::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Text(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Text(value)
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Field::Number(value)
    }
}

impl From<u8> for Field {
    fn from(value: u8) -> Self {
        Field::Number(value as f64)
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Field::Number(value as f64)
    }
}

/// One example row: ordered field name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Field>,
}

impl Record {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Field>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or overwrite a field. New fields go last; overwritten fields keep their position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Field>) -> Option<Field> {
        self.fields.insert(name.into(), value.into())
    }

    /// Look a field up without failing.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Look a field up.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingField`] if the record has no such field.
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| PipelineError::MissingField(name.to_string()))
    }

    /// A numeric field.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingField`] or [`PipelineError::NotNumeric`].
    pub fn number(&self, name: &str) -> Result<f64> {
        self.field(name)?
            .as_number()
            .ok_or_else(|| PipelineError::NotNumeric(name.to_string()))
    }

    /// A text field. Numbers are rejected.
    pub fn text(&self, name: &str) -> Result<&str> {
        self.field(name)?
            .as_text()
            .ok_or_else(|| PipelineError::Data(format!("Field '{name}' is not text")))
    }

    /// Fields in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Field>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Every field after the first, as floats, in column order.
///
/// The first column is assumed to be the text.
///
/// # Errors
///
/// [`PipelineError::NotNumeric`] if any of those fields is text.
pub fn label_vector(record: &Record) -> Result<Vec<f64>> {
    record
        .iter()
        .skip(1)
        .map(|(name, field)| {
            field
                .as_number()
                .ok_or_else(|| PipelineError::NotNumeric(name.to_string()))
        })
        .collect()
}

/// Text plus its label vector, ready for tokenization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    /// Input text.
    pub text: String,
    /// 0.0/1.0 per label, in column order.
    pub labels: Vec<f32>,
}

// ============ Table ============

/// Rows sharing one ordered set of columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// An empty table with the given columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from records. Columns are taken from the first record.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Data`] if any record's fields differ from the first record's.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let columns: Vec<String> = records
            .first()
            .map(|r| r.names().map(str::to_string).collect())
            .unwrap_or_default();
        let mut table = Self::new(columns);
        for record in records {
            table.push(record)?;
        }
        Ok(table)
    }

    /// Read a CSV with a header row.
    ///
    /// Cells are stored verbatim as [`Field::Text`]; numeric accessors parse
    /// them on demand.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Data`] on ragged rows or repeated header names.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(PipelineError::Data(format!("Duplicate CSV column '{name}'")));
            }
        }

        let mut rows = Vec::new();
        for row in reader.records() {
            let row = row?;
            rows.push(
                columns
                    .iter()
                    .zip(row.iter())
                    .map(|(name, raw)| (name.clone(), Field::Text(raw.to_string())))
                    .collect::<Record>(),
            );
        }

        tracing::debug!(rows = rows.len(), columns = columns.len(), "Loaded CSV table");
        Ok(Self { columns, rows })
    }

    /// Read a CSV file with a header row.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            PipelineError::Data(format!("Failed to open '{}': {e}", path.display()))
        })?;
        Self::from_csv_reader(file)
    }

    /// Write the table as CSV with a header row.
    pub fn to_csv_writer<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|(_, field)| field.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Data`] if the record's fields do not match the table's columns.
    pub fn push(&mut self, record: Record) -> Result<()> {
        if !record.names().eq(self.columns.iter().map(String::as_str)) {
            return Err(PipelineError::Data(format!(
                "Record fields [{}] do not match table columns [{}]",
                record.names().collect::<Vec<_>>().join(", "),
                self.columns.join(", ")
            )));
        }
        self.rows.push(record);
        Ok(())
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Iterate rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.rows.iter()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n_train` rows and the remainder, order preserved.
    pub fn split_at(&self, n_train: usize) -> (Table, Table) {
        let cut = n_train.min(self.rows.len());
        let (train, test) = self.rows.split_at(cut);
        (
            Table {
                columns: self.columns.clone(),
                rows: train.to_vec(),
            },
            Table {
                columns: self.columns.clone(),
                rows: test.to_vec(),
            },
        )
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> Result<Table> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut projected = Record::new();
            for &name in columns {
                projected.insert(name, row.field(name)?.clone());
            }
            rows.push(projected);
        }
        Ok(Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// Text from `text_column` plus the [`label_vector`] of every row.
    ///
    /// `text_column` is expected to be the first column.
    pub fn label_vectors(&self, text_column: &str) -> Result<Vec<LabeledExample>> {
        self.rows
            .iter()
            .map(|row| {
                Ok(LabeledExample {
                    text: row.field(text_column)?.to_string(),
                    labels: label_vector(row)?.into_iter().map(|v| v as f32).collect(),
                })
            })
            .collect()
    }

    /// Chunk `text_column` into batches of at most `batch_size` texts.
    pub fn response_batches(&self, text_column: &str, batch_size: usize) -> Result<Vec<Batch>> {
        if batch_size == 0 {
            return Err(PipelineError::InvalidParams(
                "Batch size must be greater than zero".into(),
            ));
        }
        self.rows
            .chunks(batch_size)
            .map(|chunk| {
                let texts = chunk
                    .iter()
                    .map(|row| row.field(text_column).map(Field::to_string))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Batch::new(texts))
            })
            .collect()
    }

    /// Merge predicted label columns into rows `offset..offset + labels.len()`.
    ///
    /// New columns are appended and start at 0 for every row; existing columns
    /// are overwritten only inside the range.
    pub fn append_labels(&mut self, labels: &BatchLabels, offset: usize) -> Result<()> {
        let end = offset.checked_add(labels.len()).ok_or_else(|| {
            PipelineError::InvalidParams(format!("Label offset {offset} is out of range"))
        })?;
        if end > self.rows.len() {
            return Err(PipelineError::InvalidParams(format!(
                "Labels for rows {offset}..{end} do not fit a table of {} rows",
                self.rows.len()
            )));
        }

        for (name, values) in labels.columns() {
            if !self.columns.iter().any(|c| c == name) {
                self.columns.push(name.clone());
                for row in &mut self.rows {
                    row.insert(name.clone(), 0u8);
                }
            }
            for (row, &value) in self.rows[offset..end].iter_mut().zip(values) {
                row.insert(name.clone(), value);
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Positional train/test split: the first `n_train` rows, then the rest.
///
/// No shuffling. If `n_train` exceeds the table length the test split is empty.
pub fn create_train_test_split(table: &Table, n_train: usize) -> (Table, Table) {
    table.split_at(n_train)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "response,pay,culture\n\
                       Better salary,1,0\n\
                       Great team,0,1\n\
                       Nothing,0,0\n";

    #[test]
    fn text_cells_read_as_numbers() {
        assert_eq!(Field::from("1").as_number(), Some(1.0));
        assert_eq!(Field::from(" 0.5 ").as_number(), Some(0.5));
        assert_eq!(Field::from("NaN").as_number(), None);
        assert_eq!(Field::from("hello").as_number(), None);
        assert_eq!(Field::from(1u8).as_text(), None);
    }

    #[test]
    fn numeric_looking_responses_stay_verbatim() {
        let csv = "response,pay\n007,1\n1.50,0\n1e3,0\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();

        let batches = table.response_batches("response", 10).unwrap();
        assert_eq!(batches[0].responses, vec!["007", "1.50", "1e3"]);
        assert_eq!(table.rows()[0].text("response").unwrap(), "007");
        assert_eq!(table.rows()[0].number("pay").unwrap(), 1.0);
        assert_eq!(table.label_vectors("response").unwrap()[1].text, "1.50");

        let mut out = Vec::new();
        table.to_csv_writer(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), csv);
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let err = Table::from_csv_reader("response,pay,pay\nhi,1,0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::Data(ref msg) if msg.contains("'pay'")));
    }

    #[test]
    fn append_labels_rejects_overflowing_offset() {
        let mut table = Table::from_csv_reader(CSV.as_bytes()).unwrap();
        let labels = crate::labeling::ThresholdLabelerBuilder::trained()
            .build()
            .unwrap()
            .label_batch(&Batch::new(["x"]), &OnlyPay)
            .unwrap();
        let err = table.append_labels(&labels, usize::MAX).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParams(_)));
    }

    struct OnlyPay;

    impl crate::labeling::TextClassifier for OnlyPay {
        fn id2label(&self) -> Vec<String> {
            vec!["pay".into()]
        }

        fn classify(&self, texts: &[&str]) -> Result<Vec<Vec<crate::labeling::Prediction>>> {
            Ok(texts
                .iter()
                .map(|_| vec![crate::labeling::Prediction::new("pay", 0.9)])
                .collect())
        }
    }

    #[test]
    fn label_vector_skips_first_field() {
        let record = Record::new()
            .with("response", "text")
            .with("pay", 1)
            .with("culture", 0);
        assert_eq!(label_vector(&record).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn label_vector_rejects_text_labels() {
        let record = Record::new().with("response", "a").with("pay", "yes");
        let err = label_vector(&record).unwrap_err();
        assert!(matches!(err, PipelineError::NotNumeric(ref name) if name == "pay"));
    }

    #[test]
    fn loads_csv_in_order() {
        let table = Table::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["response", "pay", "culture"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[1].text("response").unwrap(), "Great team");
        assert_eq!(table.rows()[1].number("culture").unwrap(), 1.0);
    }

    #[test]
    fn ragged_csv_is_rejected() {
        let err = Table::from_csv_reader("a,b\n1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::Data(_)));
        assert_eq!(err.to_string().matches("CSV error").count(), 1);
    }

    #[test]
    fn select_projects_columns() {
        let table = Table::from_csv_reader(CSV.as_bytes()).unwrap();
        let projected = table.select(&["culture", "response"]).unwrap();
        assert_eq!(projected.columns(), &["culture", "response"]);
        assert!(table.select(&["missing"]).is_err());
    }

    #[test]
    fn push_checks_columns() {
        let mut table = Table::new(["response", "pay"]);
        assert!(table.push(Record::new().with("response", "x").with("pay", 1)).is_ok());
        assert!(table.push(Record::new().with("pay", 1).with("response", "x")).is_err());
    }

    #[test]
    fn batches_cover_all_rows() {
        let table = Table::from_csv_reader(CSV.as_bytes()).unwrap();
        let batches = table.response_batches("response", 2).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].responses, vec!["Better salary", "Great team"]);
        assert_eq!(batches[1].responses, vec!["Nothing"]);
        assert!(table.response_batches("response", 0).is_err());
    }

    #[test]
    fn csv_round_trip_keeps_values() {
        let table = Table::from_csv_reader(CSV.as_bytes()).unwrap();
        let mut out = Vec::new();
        table.to_csv_writer(&mut out).unwrap();
        let reloaded = Table::from_csv_reader(out.as_slice()).unwrap();
        assert_eq!(reloaded, table);
    }
}
