pub mod directory;
pub mod parser;
pub mod source;

pub use directory::{DirectoryError, LogInfo};
pub use parser::{parse_line, ParseError};
pub use source::{DemoSource, FetchQuery, FileSource, LogSource, SourceError};
