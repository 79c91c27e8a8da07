pub use commands::{CreateRecordCmd, ReceiptUpload, RecordInput, UpdateRecordCmd};
pub use diff::{ChangeSet, FieldChange, RecordDiff};
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder, MutationStage, UpdateOutcome};
pub use query::{ListQuery, RecordKind, SortColumn, SortDirection, SortOrder};
pub use records::{Record, RecordFields};
pub use storage::{
    CloudObjectStorage, LocalDiskStorage, MediaType, StorageBackend, StorageError, StorageResult,
};
pub use store::{RecordStore, Summary};

mod commands;
mod diff;
mod error;
mod ops;
mod query;
mod records;
pub mod storage;
mod store;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
