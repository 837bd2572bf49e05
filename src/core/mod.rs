mod error;
mod types;
mod value;

pub use error::{PurgeError, Result};
pub use types::{Column, Row, Schema};
pub use value::{DataType, Value};
