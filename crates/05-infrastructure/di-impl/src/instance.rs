//! 组件实例工厂
//!
//! 缓存单例实例并负责按需创建

use dashmap::DashMap;
use di_abstractions::{BeanDefinition, DependencyResolver, Instance};
use infrastructure_common::DependencyResult;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 单例实例槽，首次初始化成功后不再改变
type InstanceCell = Arc<OnceCell<Instance>>;

/// 组件实例工厂
///
/// 每个单例定义对应一个实例槽，同一定义的并发首次访问只会调用一次工厂。
/// 不同定义的创建互不阻塞，工厂可以在其他线程上解析别的定义。
#[derive(Debug, Default)]
pub struct InstanceFactory {
    /// 单例实例槽
    instances: DashMap<Uuid, InstanceCell>,
}

impl InstanceFactory {
    /// 创建新的实例工厂
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取或创建组件实例
    ///
    /// 瞬时定义每次都调用工厂；单例定义命中缓存时直接返回。
    /// 工厂失败时实例槽保持为空，下次访问重新创建。
    pub fn retrieve_instance(
        &self,
        definition: &BeanDefinition,
        resolver: &dyn DependencyResolver,
    ) -> DependencyResult<Instance> {
        if !definition.lifetime().is_cached() {
            debug!("创建瞬时实例: {}", definition);
            return definition.create(resolver);
        }

        // 分片锁在语句结束时释放，工厂运行期间不持有 DashMap 的锁
        let cell = Arc::clone(self.instances.entry(definition.id()).or_default().value());

        cell.get_or_try_init(|| {
            debug!("创建单例实例: {}", definition);
            definition.create(resolver)
        })
        .map(Arc::clone)
    }

    /// 删除指定定义的缓存实例，返回实际删除的数量
    pub fn drop_all_instances(&self, definitions: &[Arc<BeanDefinition>]) -> usize {
        definitions
            .iter()
            .filter(|d| self.drop_instance(d.id()))
            .count()
    }

    /// 删除单个定义的缓存实例
    pub fn drop_instance(&self, id: Uuid) -> bool {
        self.instances
            .remove(&id)
            .is_some_and(|(_, cell)| cell.get().is_some())
    }

    /// 指定定义是否已有缓存实例
    pub fn is_created(&self, id: Uuid) -> bool {
        self.instances
            .get(&id)
            .is_some_and(|cell| cell.get().is_some())
    }

    /// 缓存实例数量
    pub fn instance_count(&self) -> usize {
        self.instances
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// 清理所有缓存实例
    pub fn clear(&self) {
        self.instances.clear();
    }
}
