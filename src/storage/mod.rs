mod filter;
mod memory;
mod table;

pub use filter::Filter;
pub use memory::InMemoryStorage;
pub use table::{Table, TableSchema};
