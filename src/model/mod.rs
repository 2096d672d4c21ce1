//! Types that represent the core data model, such as `Record`, `Value` and `TableSchema`, and the
//! pure functions that turn raw store rows into them.
mod amount;
mod category;
pub mod coerce;
pub mod decode;
mod record;
pub mod schema;
mod value;

pub use amount::{Amount, AmountFormat};
pub use category::{CategoryKind, CategoryMap, Frequency, TransactionType};
pub use decode::RawTable;
pub use record::{fields_from_body, Confirmation, Fields, Record};
pub use schema::{lookup, Column, FieldKind, SignRule, Table, TableSchema};
pub use value::Value;
