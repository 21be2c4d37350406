pub mod pipeline;
pub mod source;

pub use crate::domain::model::{FileType, ImportJob, ImportSummary, Record, RowPolicy, UploadTarget};
pub use crate::domain::ports::{Collection, Connector, Database, DocumentStore, ProgressObserver};
pub use crate::utils::error::Result;
