//! 组件定义

use crate::factory::{erase_factory, FactoryFn, Instance};
use crate::resolver::DependencyResolver;
use infrastructure_common::{DependencyResult, Lifetime, TypeKey};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 默认作用域
pub const ROOT_SCOPE: &str = "root";

/// 组件定义
///
/// 注册后不可变，由注册表以 `Arc` 共享。`id` 是定义的唯一身份，
/// 实例缓存按 `id` 存取。
pub struct BeanDefinition {
    /// 定义ID
    id: Uuid,
    /// 组件声明类型
    type_key: TypeKey,
    /// 组件名称，`None` 表示主组件
    name: Option<String>,
    /// 所属作用域
    scope_id: String,
    /// 生命周期
    lifetime: Lifetime,
    /// 是否在启动时创建
    created_at_start: bool,
    /// 组件工厂
    factory: FactoryFn,
}

impl BeanDefinition {
    /// 创建新的组件定义
    pub fn new<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn DependencyResolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            type_key: TypeKey::of::<T>(),
            name: None,
            scope_id: ROOT_SCOPE.to_string(),
            lifetime,
            created_at_start: false,
            factory: erase_factory(factory),
        }
    }

    /// 创建单例组件定义
    pub fn singleton<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn DependencyResolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        Self::new(Lifetime::Singleton, factory)
    }

    /// 创建瞬时组件定义
    pub fn transient<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn DependencyResolver) -> DependencyResult<T> + Send + Sync + 'static,
    {
        Self::new(Lifetime::Transient, factory)
    }

    /// 设置名称，空名称表示主组件
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.is_empty() { None } else { Some(name) };
        self
    }

    /// 设置所属作用域
    pub fn in_scope(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = scope_id.into();
        self
    }

    /// 设置是否在启动时创建
    pub fn with_created_at_start(mut self, enabled: bool) -> Self {
        self.created_at_start = enabled;
        self
    }

    /// 复制一份标记为启动时创建的定义，保留定义身份
    pub(crate) fn to_eager(&self) -> Self {
        Self {
            id: self.id,
            type_key: self.type_key,
            name: self.name.clone(),
            scope_id: self.scope_id.clone(),
            lifetime: self.lifetime,
            created_at_start: true,
            factory: Arc::clone(&self.factory),
        }
    }

    /// 定义ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 组件声明类型
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// 组件名称
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 是否为主组件（未命名）
    pub fn is_primary(&self) -> bool {
        self.name.is_none()
    }

    /// 所属作用域
    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    /// 生命周期
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// 是否在启动时创建
    pub fn is_created_at_start(&self) -> bool {
        self.created_at_start
    }

    /// 调用工厂创建新实例
    pub fn create(&self, resolver: &dyn DependencyResolver) -> DependencyResult<Instance> {
        (self.factory)(resolver)
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("id", &self.id)
            .field("type_key", &self.type_key)
            .field("name", &self.name)
            .field("scope_id", &self.scope_id)
            .field("lifetime", &self.lifetime)
            .field("created_at_start", &self.created_at_start)
            .field("factory", &"<function>")
            .finish()
    }
}

impl fmt::Display for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}: ", self.lifetime)?;
        if let Some(name) = &self.name {
            write!(f, "'{}' ", name)?;
        }
        write!(f, "{} (scope: {})]", self.type_key, self.scope_id)
    }
}
