//! 组件工厂抽象
//!
//! 组件实例以类型擦除的形式在容器中流转，工厂函数在注册时被擦除类型

use crate::resolver::DependencyResolver;
use infrastructure_common::DependencyResult;
use std::any::Any;
use std::sync::Arc;

/// 类型擦除后的组件实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 组件工厂函数类型
///
/// 工厂通过传入的解析器获取自身依赖
pub type FactoryFn =
    Arc<dyn Fn(&dyn DependencyResolver) -> DependencyResult<Instance> + Send + Sync>;

/// 将带类型的工厂闭包擦除为 [`FactoryFn`]
pub fn erase_factory<T, F>(factory: F) -> FactoryFn
where
    T: Send + Sync + 'static,
    F: Fn(&dyn DependencyResolver) -> DependencyResult<T> + Send + Sync + 'static,
{
    Arc::new(move |resolver: &dyn DependencyResolver| {
        let component = factory(resolver)?;
        Ok(Arc::new(component) as Instance)
    })
}
