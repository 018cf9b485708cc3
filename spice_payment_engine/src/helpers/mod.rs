pub mod statement_import;
pub mod statement_matching;

pub use statement_import::{parse_statement_csv, StatementImportError};
