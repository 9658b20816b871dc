pub mod adapter;
pub mod codec;
pub mod config;
pub mod connection;
pub mod entity;
pub mod error;
pub mod key;
pub mod lazy;
pub mod raw;
pub mod value;
pub mod wire;

pub use adapter::{Adapter, ModelAdapter, Record};
pub use codec::{FieldDecoder, PropertyDecoder};
pub use config::ConnectionConfig;
pub use connection::{ApiVersion, Connection, Transport};
pub use entity::Entity;
pub use error::{DecodeError, EncodeError, ErrorKind, ParseError, RecordError, StoreError};
pub use key::{Key, KeyId};
pub use lazy::LazyRecord;
pub use raw::{RawField, RawRecord};
pub use value::FieldValue;
