//! Access to the externally authored level data.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Lines};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::level::parser::{ColumnMap, LevelRecord, LevelRowParser};

/// Where level rows are read from.
#[derive(Debug, Clone)]
pub enum LevelSource {
    File(PathBuf),
    /// Level data held in memory, as if it were the contents of a file.
    Inline(Arc<str>),
}

/// Reads level records from a [`LevelSource`].
///
/// Nothing is cached: every [`load`](LevelCatalog::load) reopens the source and streams it, so edits to the
/// data file are picked up on the next level transition.
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    source: LevelSource,
}

impl LevelCatalog {
    pub fn new(source: LevelSource) -> Self {
        Self { source }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(LevelSource::File(path.into()))
    }

    pub fn from_inline(data: impl Into<Arc<str>>) -> Self {
        Self::new(LevelSource::Inline(data.into()))
    }

    pub fn source(&self) -> &LevelSource {
        &self.source
    }

    /// Streams the records belonging to `level_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the source file does not exist or cannot be opened.
    /// Malformed rows are skipped and never surface as errors.
    pub fn load(&self, level_id: u32) -> Result<LevelRecords, ConfigError> {
        let mut lines = self.open()?;
        let columns = match lines.next() {
            Some(Ok(header)) => ColumnMap::from_header(&header),
            Some(Err(source)) => return Err(self.unreadable(source)),
            None => ColumnMap::default(),
        };

        Ok(LevelRecords {
            lines,
            columns,
            level_id,
        })
    }

    /// The highest level id present in the source, or 1 if the source is absent, empty or unreadable.
    pub fn max_level(&self) -> u32 {
        let Ok(mut lines) = self.open() else {
            debug!(source = ?self.source, "Level data unavailable, assuming a single level");
            return 1;
        };
        let Some(Ok(header)) = lines.next() else {
            return 1;
        };
        let columns = ColumnMap::from_header(&header);

        lines
            .map_while(Result::ok)
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| LevelRowParser::parse_level(&columns, &line, 1).ok())
            .fold(1, u32::max)
    }

    fn open(&self) -> Result<Lines<Box<dyn BufRead>>, ConfigError> {
        let reader: Box<dyn BufRead> = match &self.source {
            LevelSource::File(path) => Box::new(BufReader::new(open_file(path)?)),
            LevelSource::Inline(data) => Box::new(Cursor::new(SharedText(Arc::clone(data)))),
        };
        Ok(reader.lines())
    }

    fn unreadable(&self, source: io::Error) -> ConfigError {
        let path = match &self.source {
            LevelSource::File(path) => path.clone(),
            LevelSource::Inline(_) => PathBuf::from("<inline>"),
        };
        ConfigError::Unreadable { path, source }
    }
}

/// Inline level data viewed as bytes, sharing the catalog's buffer instead of copying it.
struct SharedText(Arc<str>);

impl AsRef<[u8]> for SharedText {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

fn open_file(path: &Path) -> Result<File, ConfigError> {
    File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::MissingLevelData(path.to_path_buf()),
        _ => ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// A lazy stream of the records for one level.
pub struct LevelRecords {
    lines: Lines<Box<dyn BufRead>>,
    columns: ColumnMap,
    level_id: u32,
}

impl Iterator for LevelRecords {
    type Item = LevelRecord;

    fn next(&mut self) -> Option<LevelRecord> {
        for line in self.lines.by_ref() {
            // A read failure mid-stream ends the level rather than failing it.
            let line = match line {
                Ok(line) => line,
                Err(error) => {
                    debug!(%error, "Level data stream interrupted");
                    return None;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            match LevelRowParser::parse_row(&self.columns, &line) {
                Ok((level, record)) if level == self.level_id => return Some(record),
                Ok(_) => {}
                Err(error) => trace!(%error, row = %line, "Skipping malformed level row"),
            }
        }
        None
    }
}
