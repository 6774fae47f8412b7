//! In-memory adapter / 内存适配器

mod driver;
mod factory;

pub use driver::{MemoryAdapter, MemoryStore, Node};
pub use factory::MemoryAdapterFactory;
