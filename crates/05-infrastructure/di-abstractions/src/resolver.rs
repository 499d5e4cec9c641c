//! 组件解析器抽象接口
//!
//! 提供依赖解析能力和循环依赖检测用的解析栈

use crate::factory::Instance;
use infrastructure_common::{ConfigError, ConfigResult, DependencyError, DependencyResult, TypeKey};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// 依赖解析器 trait
///
/// 工厂函数在创建组件时通过它请求自身的依赖。实现者负责循环依赖检测。
pub trait DependencyResolver {
    /// 按类型键（以及可选名称）解析组件实例
    fn resolve_dependency(&self, key: TypeKey, name: Option<&str>) -> DependencyResult<Instance>;

    /// 读取属性原始值
    fn property_value(&self, key: &str) -> Option<Value>;
}

impl<'r> dyn DependencyResolver + 'r {
    /// 解析指定类型的主组件
    pub fn get<T>(&self) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get_with(None)
    }

    /// 解析指定名称的组件
    pub fn get_named<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get_with(Some(name))
    }

    /// 解析组件，名称为空时按类型查找
    pub fn get_with<T>(&self, name: Option<&str>) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let instance = self.resolve_dependency(TypeKey::of::<T>(), name)?;
        downcast_instance::<T>(instance)
    }

    /// 读取属性并转换为指定类型，属性不存在时返回 `None`
    pub fn get_property<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        convert_property(key, self.property_value(key))
    }
}

/// 将类型擦除的实例还原为具体类型
pub fn downcast_instance<T>(instance: Instance) -> DependencyResult<Arc<T>>
where
    T: Send + Sync + 'static,
{
    instance
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            actual: "<unknown>".to_string(),
        })
}

/// 将属性原始值转换为指定类型
///
/// `null` 与不存在等价
pub fn convert_property<T>(key: &str, value: Option<Value>) -> ConfigResult<Option<T>>
where
    T: DeserializeOwned,
{
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ConfigError::TypeConversionError {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}

/// 解析栈
///
/// 记录一次顶层解析中正在进行的依赖链。每次顶层解析独占一个解析栈，
/// 同一类型键在栈中最多出现一次。
#[derive(Debug, Clone, Default)]
pub struct ResolutionStack {
    /// 当前解析链
    chain: Vec<TypeKey>,
}

impl ResolutionStack {
    /// 创建空解析栈
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加类型到解析链
    ///
    /// 类型已在链中时返回循环依赖错误，解析栈保持不变
    pub fn push(&mut self, key: TypeKey) -> DependencyResult<()> {
        if self.contains(key) {
            return Err(DependencyError::CyclicDependency {
                type_name: key.name().to_string(),
                dependency_chain: self.describe_cycle(key),
            });
        }
        self.chain.push(key);
        Ok(())
    }

    /// 从解析链中弹出类型，并校验其与入栈类型一致
    ///
    /// 不一致时清空整个解析栈
    pub fn pop(&mut self, expected: TypeKey) -> DependencyResult<()> {
        match self.chain.pop() {
            Some(head) if head == expected => Ok(()),
            head => {
                self.chain.clear();
                Err(DependencyError::StackCorruption {
                    expected: expected.name().to_string(),
                    actual: head.map_or_else(|| "<empty>".to_string(), |k| k.name().to_string()),
                })
            }
        }
    }

    /// 是否包含指定类型
    pub fn contains(&self, key: TypeKey) -> bool {
        self.chain.contains(&key)
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// 解析栈是否为空
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// 清空解析栈
    pub fn clear(&mut self) {
        self.chain.clear();
    }

    /// 当前解析链
    pub fn chain(&self) -> &[TypeKey] {
        &self.chain
    }

    fn describe_cycle(&self, closing: TypeKey) -> String {
        self.chain
            .iter()
            .chain(std::iter::once(&closing))
            .map(|k| k.short_name())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
