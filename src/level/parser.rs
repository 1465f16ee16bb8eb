//! Parsing for the tabular level data format.
//!
//! The source is comma separated with a header row naming the columns
//! `level, kind, x, y, w, h, param`. Column order is taken from the header, so authors may reorder
//! or omit columns; an omitted numeric column reads as zero.

use std::str::FromStr;

use glam::Vec2;
use strum_macros::{EnumString, IntoStaticStr};

use crate::error::RowError;

/// The kind of object a level row places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum RecordKind {
    Start,
    Wall,
    Enemy,
    #[strum(serialize = "oxy", serialize = "oxygen")]
    Oxygen,
    Door,
    Exit,
}

/// A single placed object. Coordinates are the object's center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelRecord {
    pub kind: RecordKind,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub param: f32,
}

impl LevelRecord {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }
}

/// Positions of the known columns within a row, as read from the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    level: Option<usize>,
    kind: Option<usize>,
    x: Option<usize>,
    y: Option<usize>,
    w: Option<usize>,
    h: Option<usize>,
    param: Option<usize>,
}

impl ColumnMap {
    /// Reads the header row. Unknown column names are ignored.
    pub fn from_header(header: &str) -> Self {
        let mut columns = Self::default();
        for (index, name) in split_row(header).enumerate() {
            let slot = match name.to_ascii_lowercase().as_str() {
                "level" => &mut columns.level,
                "kind" => &mut columns.kind,
                "x" => &mut columns.x,
                "y" => &mut columns.y,
                "w" => &mut columns.w,
                "h" => &mut columns.h,
                "param" => &mut columns.param,
                _ => continue,
            };
            slot.get_or_insert(index);
        }
        columns
    }
}

/// Parser for converting raw level rows into records.
pub struct LevelRowParser;

impl LevelRowParser {
    /// Reads the `level` column of a row.
    ///
    /// Returns `default` when the header has no level column.
    pub fn parse_level(columns: &ColumnMap, row: &str, default: u32) -> Result<u32, RowError> {
        let cells: Vec<&str> = split_row(row).collect();
        match columns.level {
            Some(index) => parse_cell(&cells, index, "level"),
            None => Ok(default),
        }
    }

    /// Parses a full row into its level id and record.
    ///
    /// # Errors
    ///
    /// Returns a [`RowError`] if the kind is missing or unknown, or a numeric cell does not parse.
    /// A row that is shorter than the header reads its missing cells as zero.
    pub fn parse_row(columns: &ColumnMap, row: &str) -> Result<(u32, LevelRecord), RowError> {
        let cells: Vec<&str> = split_row(row).collect();

        let level = match columns.level {
            Some(index) => parse_cell(&cells, index, "level")?,
            None => 0,
        };

        let kind = columns
            .kind
            .and_then(|index| cells.get(index))
            .filter(|cell| !cell.is_empty())
            .ok_or(RowError::MissingKind)?;
        let kind = RecordKind::from_str(kind).map_err(|_| RowError::UnknownKind(kind.to_string()))?;

        let number = |index: Option<usize>, column: &'static str| -> Result<f32, RowError> {
            match index {
                Some(index) => parse_cell(&cells, index, column),
                None => Ok(0.0),
            }
        };

        let record = LevelRecord {
            kind,
            x: number(columns.x, "x")?,
            y: number(columns.y, "y")?,
            w: number(columns.w, "w")?,
            h: number(columns.h, "h")?,
            param: number(columns.param, "param")?,
        };

        Ok((level, record))
    }
}

fn split_row(row: &str) -> impl Iterator<Item = &str> {
    row.split(',').map(str::trim)
}

fn parse_cell<T: FromStr + Default>(cells: &[&str], index: usize, column: &'static str) -> Result<T, RowError> {
    match cells.get(index) {
        Some(cell) => cell.parse().map_err(|_| RowError::InvalidNumber {
            column,
            value: cell.to_string(),
        }),
        None => Ok(T::default()),
    }
}
