//! 属性注册表

use di_abstractions::convert_property;
use infrastructure_common::ConfigResult;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// 属性注册表
///
/// 保存解析过程中使用的配置属性。读取不存在的属性返回 `None`，不视为错误。
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    properties: RwLock<HashMap<String, Value>>,
}

impl PropertyRegistry {
    /// 创建空属性注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置属性
    pub fn set_property(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        debug!("设置属性: {}", key);
        self.properties.write().insert(key, value.into());
    }

    /// 批量设置属性
    pub fn extend<I>(&self, properties: I) -> usize
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut guard = self.properties.write();
        let before = guard.len();
        guard.extend(properties);
        guard.len() - before
    }

    /// 读取属性原始值
    pub fn get_property_value(&self, key: &str) -> Option<Value> {
        self.properties.read().get(key).cloned()
    }

    /// 读取属性并转换为指定类型
    pub fn get_property<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        convert_property(key, self.get_property_value(key))
    }

    /// 属性数量
    pub fn len(&self) -> usize {
        self.properties.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.properties.read().is_empty()
    }

    /// 清理所有属性
    pub fn clear(&self) {
        self.properties.write().clear();
    }
}
