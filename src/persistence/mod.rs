pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryKv;
pub use sqlite::SqliteKv;
pub use traits::KvBackend;
