//! Local disk adapter / 本地磁盘适配器

mod driver;
mod factory;

pub use driver::LocalAdapter;
pub use factory::LocalAdapterFactory;
