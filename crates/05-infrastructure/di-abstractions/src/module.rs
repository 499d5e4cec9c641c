//! 组件模块
//!
//! 模块是一组共享作用域的组件定义，是向容器注册定义的唯一入口。

use crate::definition::{BeanDefinition, ROOT_SCOPE};
use crate::resolver::DependencyResolver;
use infrastructure_common::{DependencyResult, Lifetime};
use std::sync::Arc;
use uuid::Uuid;

/// 组件模块
///
/// 克隆出的模块与原模块共享定义身份，因此可以用同一个模块加载和卸载。
#[derive(Debug, Clone)]
pub struct Module {
    /// 模块ID
    id: Uuid,
    /// 模块内定义所属的作用域
    scope_id: String,
    /// 组件定义
    definitions: Vec<Arc<BeanDefinition>>,
    /// 是否允许覆盖已有定义
    allow_override: bool,
    /// 模块内所有定义是否在启动时创建
    created_at_start: bool,
}

impl Module {
    /// 创建新模块
    pub fn new(scope_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope_id: scope_id.into(),
            definitions: Vec::new(),
            allow_override: false,
            created_at_start: false,
        }
    }

    /// 创建根作用域模块
    pub fn root() -> Self {
        Self::new(ROOT_SCOPE)
    }

    /// 允许模块内的定义覆盖已注册的同名定义
    pub fn allow_override(mut self, enabled: bool) -> Self {
        self.allow_override = enabled;
        self
    }

    /// 模块内所有定义在启动时创建，包括调用之前和之后添加的定义
    pub fn created_at_start(mut self) -> Self {
        self.created_at_start = true;
        for definition in &mut self.definitions {
            if !definition.is_created_at_start() {
                *definition = Arc::new(definition.to_eager());
            }
        }
        self
    }

    /// 添加组件定义，定义的作用域被改写为模块作用域
    pub fn definition(mut self, definition: BeanDefinition) -> Self {
        let eager = self.created_at_start || definition.is_created_at_start();
        let definition = definition
            .in_scope(self.scope_id.clone())
            .with_created_at_start(eager);
        self.definitions.push(Arc::new(definition));
        self
    }

    /// 添加单例定义
    pub fn single<T, F>(self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn DependencyResolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.definition(BeanDefinition::new(Lifetime::Singleton, factory))
    }

    /// 添加命名单例定义
    pub fn single_named<T, F>(self, name: impl Into<String>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn DependencyResolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.definition(BeanDefinition::new(Lifetime::Singleton, factory).named(name))
    }

    /// 添加瞬时定义
    pub fn factory<T, F>(self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn DependencyResolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.definition(BeanDefinition::new(Lifetime::Transient, factory))
    }

    /// 添加命名瞬时定义
    pub fn factory_named<T, F>(self, name: impl Into<String>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn DependencyResolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.definition(BeanDefinition::new(Lifetime::Transient, factory).named(name))
    }

    /// 模块ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 模块作用域
    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    /// 是否允许覆盖
    pub fn allows_override(&self) -> bool {
        self.allow_override
    }

    /// 模块内的组件定义
    pub fn definitions(&self) -> &[Arc<BeanDefinition>] {
        &self.definitions
    }

    /// 定义数量
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// 是否没有定义
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
