use std::fmt;

#[derive(Debug)]
pub enum IngestError {
    /// File could not be opened or read.
    Read { path: String, message: String },
    /// The sheet ends before the expected header row.
    MissingHeader { path: String, header_row: usize },
    /// A required column is absent from the header row.
    MissingColumn { path: String, column: String },
    /// The workbook contains no sheets at all.
    EmptyWorkbook { path: String },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {path}: {message}"),
            Self::MissingHeader { path, header_row } => {
                write!(f, "{path}: no header found on row {header_row}")
            }
            Self::MissingColumn { path, column } => {
                write!(f, "{path}: missing required column '{column}'")
            }
            Self::EmptyWorkbook { path } => write!(f, "{path}: workbook has no sheets"),
        }
    }
}

impl std::error::Error for IngestError {}

#[derive(Debug)]
pub enum OutputError {
    /// rust_xlsxwriter failed while emitting the workbook.
    Workbook(String),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workbook(msg) => write!(f, "workbook write error: {msg}"),
        }
    }
}

impl std::error::Error for OutputError {}

impl From<rust_xlsxwriter::XlsxError> for OutputError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Workbook(err.to_string())
    }
}

/// Either side of a run can fail; the engine in between cannot.
#[derive(Debug)]
pub enum Error {
    Ingest(IngestError),
    Output(OutputError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingest(e) => e.fmt(f),
            Self::Output(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<IngestError> for Error {
    fn from(err: IngestError) -> Self {
        Self::Ingest(err)
    }
}

impl From<OutputError> for Error {
    fn from(err: OutputError) -> Self {
        Self::Output(err)
    }
}
