use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rusqlite::Connection;
use rusqlite::types::{ToSql, ToSqlOutput, Value};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::DumpError;

/// One value of a dumped record.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Cell::Null, Cell::Text)
    }
}

impl Cell {
    /// CSV rendering: nulls become empty cells.
    fn to_csv(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Integer(i) => i.to_string(),
            Cell::Real(f) => f.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Integer(i) => serializer.serialize_i64(*i),
            Cell::Real(f) => serializer.serialize_f64(*f),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Null => ToSqlOutput::Owned(Value::Null),
            Cell::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Cell::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Cell::Text(s) => s.to_sql()?,
        })
    }
}

/// A column of the output: the name used in CSV/JSON, plus how it is
/// declared when written to a SQLite file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sqlite_name: &'static str,
    pub sqlite_type: &'static str,
}

/// Rows already projected onto the requested columns, in output order.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl Projection {
    fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }
}

struct RecordRef<'a> {
    columns: &'a [Column],
    cells: &'a [Cell],
}

impl Serialize for RecordRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column.name, cell)?;
        }
        map.end()
    }
}

impl Serialize for Projection {
    /// A JSON array of objects, keys in column order.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for cells in &self.rows {
            seq.serialize_element(&RecordRef {
                columns: &self.columns,
                cells,
            })?;
        }
        seq.end()
    }
}

pub fn write_csv(path: &Path, projection: &Projection) -> Result<(), DumpError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(projection.names())?;
    for row in &projection.rows {
        writer.write_record(row.iter().map(Cell::to_csv))?;
    }
    writer.flush()?;
    Ok(())
}

/// `indent` of `None` or `0` writes everything on one line.
pub fn write_json(path: &Path, projection: &Projection, indent: Option<usize>) -> Result<(), DumpError> {
    let mut out = BufWriter::new(File::create(path)?);
    match indent {
        Some(width) if width > 0 => {
            let pad = vec![b' '; width];
            let formatter = serde_json::ser::PrettyFormatter::with_indent(&pad);
            let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
            projection.serialize(&mut ser)?;
        }
        _ => serde_json::to_writer(&mut out, projection)?,
    }
    out.flush()?;
    Ok(())
}

/// Build a fresh SQLite file with a single `entries` table holding the rows.
pub fn write_sqlite(path: &Path, projection: &Projection) -> Result<(), DumpError> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut conn = Connection::open(path)?;

    let mut definitions = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL".to_string()];
    definitions.extend(
        projection
            .columns
            .iter()
            .map(|c| format!("\"{}\" {}", c.sqlite_name, c.sqlite_type)),
    );
    conn.execute_batch(&format!(
        "CREATE TABLE entries ({});",
        definitions.join(", ")
    ))?;

    if projection.columns.is_empty() {
        return Ok(());
    }

    let column_list = projection
        .columns
        .iter()
        .map(|c| format!("\"{}\"", c.sqlite_name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=projection.columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let insert = format!("INSERT INTO entries ({column_list}) VALUES ({placeholders})");

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&insert)?;
        for row in &projection.rows {
            stmt.execute(rusqlite::params_from_iter(row.iter()))?;
        }
    }
    tx.commit()?;
    Ok(())
}
