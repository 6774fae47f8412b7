// Adapter package / 适配器包
pub mod local;
pub mod memory;
pub mod archive;

use crate::storage::AdapterRegistry;

/// Register all bundled adapters / 注册所有内置适配器
pub fn register_all(registry: &mut AdapterRegistry) {
    // Register local disk adapter / 注册本地磁盘适配器
    registry.register_factory(Box::new(local::LocalAdapterFactory));
    // Register in-memory adapter / 注册内存适配器
    registry.register_factory(Box::new(memory::MemoryAdapterFactory::new()));
    // Register read-only zip adapter / 注册压缩包适配器
    registry.register_factory(Box::new(archive::ZipAdapterFactory));
}
