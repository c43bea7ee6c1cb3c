//! Raw score-sheet cells and the canonical classroom record built from them.

use serde::Serialize;

/// A single spreadsheet cell as delivered by the loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Text form of the cell with surrounding whitespace removed.
    ///
    /// Numbers render the way a spreadsheet export would (`123.0` → `"123"`).
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => n.to_string(),
        }
    }

    /// Permissive numeric coercion: anything that is not a finite number is `0.0`.
    pub fn as_score(&self) -> f64 {
        let value = match self {
            Cell::Empty => return 0.0,
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        if value.is_finite() { value } else { 0.0 }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Header row plus data rows, read wholesale before any processing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Cell at `(row, column)`; short rows read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// One evaluated classroom (an instructor teaching one course section).
///
/// Built once by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassroomRecord {
    pub instructor_id: String,
    pub instructor_name: String,
    pub email: String,
    pub program: String,
    pub nrc: String,
    pub subject: String,
    pub phase1_score: f64,
    pub phase2_score: f64,
    pub final_score: f64,
    pub review_flag: String,
}

impl ClassroomRecord {
    pub fn review_status(&self) -> ReviewStatus {
        ReviewStatus::from_flag(&self.review_flag)
    }
}

/// Sampling annotation attached to a classroom, used for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReviewStatus {
    Blank,
    Selected,
    NotSelected,
    Other(String),
}

impl ReviewStatus {
    pub fn from_flag(flag: &str) -> Self {
        let upper = flag.trim().to_uppercase().replace("MUESTRO", "MUESTREO");
        if upper.is_empty() {
            return ReviewStatus::Blank;
        }
        if upper.starts_with("REV") {
            return ReviewStatus::Selected;
        }
        if upper.contains("SELECCIONADA") && !upper.contains("NO") {
            return ReviewStatus::Selected;
        }
        if upper.contains("NO SELECCIONADA") {
            return ReviewStatus::NotSelected;
        }
        ReviewStatus::Other(flag.trim().to_string())
    }

    pub fn label(&self) -> &str {
        match self {
            ReviewStatus::Blank => "—",
            ReviewStatus::Selected => "Muestreo: seleccionada",
            ReviewStatus::NotSelected => "Muestreo: no seleccionada",
            ReviewStatus::Other(text) => text,
        }
    }
}

/// Integer rendering used wherever a score is printed (`87.6` → `"87"`).
pub fn display_score(score: f64) -> String {
    if score.is_finite() {
        format!("{}", score.trunc() as i64)
    } else {
        "0".to_string()
    }
}
