//! Read-only zip archive adapter / 只读压缩包适配器

mod config;
mod driver;
mod factory;

pub use config::ZipConfig;
pub use driver::ZipAdapter;
pub use factory::ZipAdapterFactory;
