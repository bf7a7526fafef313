//! Record subsystem
//!
//! Policy and Application records: typed scalar attributes, an optional
//! dynamic schema, and the payload validated against it before every write.

mod application;
mod errors;
mod model;
mod policy;
pub mod query;
mod service;
mod store;

pub use application::{Application, ApplicationInput, ApplicationPatch};
pub use errors::{RecordError, RecordResult};
pub use model::{CreateRecord, FieldsUpdate, Record, RecordAttributes, SchemaUpdate, UpdateRecord};
pub use policy::{generate_policy_number, Policy, PolicyInput, PolicyPatch};
pub use query::{FilterExpr, FilterOperator, FilterSet, ListQuery, Page};
pub use service::{RecordService, RecordSettings, SchemaChangePolicy};
pub use store::{DocumentStore, InMemoryDocumentStore};
