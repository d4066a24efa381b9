use super::CellValue;

/// One logical data row.
///
/// `cells` are kept in the column order the data source delivered them in;
/// the owning `RowSet` translates rendered column positions on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    pub cells: Vec<CellValue>,
    /// Result of the last filter evaluation
    pub visible: bool,
}

impl RowRecord {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self {
            cells,
            visible: true,
        }
    }

    /// Cell at a source column index. Columns added after the row arrived read as empty.
    pub fn cell(&self, source_col: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.cells.get(source_col).unwrap_or(EMPTY)
    }
}

impl From<Vec<CellValue>> for RowRecord {
    fn from(cells: Vec<CellValue>) -> Self {
        Self::new(cells)
    }
}
