//! taskdesk core: record model, query specs, response envelopes, and the
//! boundary traits for the remote record service and the upload widget.

pub mod envelope;
pub mod files;
pub mod query;
pub mod record;
pub mod traits;

pub use envelope::{
    BatchResponse, DeleteBatch, Envelope, FetchResponse, FieldError, RecordOutcome,
    RecordResponse, WriteBatch,
};
pub use files::{FieldConfig, FileEntry, MountConfig, SnapshotFormat};
pub use query::{Condition, FieldDescriptor, Operator, OrderBy, QuerySpec, SortType};
pub use record::{coerce_id, coerce_id_value, Record, RecordId};
pub use traits::{Notifier, RemoteClient, SdkSource, UploadSdk, UploadWidget};
