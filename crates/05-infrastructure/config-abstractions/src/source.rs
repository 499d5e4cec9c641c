//! 属性源抽象接口

use async_trait::async_trait;
use infrastructure_common::ConfigResult;
use serde_json::Value;
use std::collections::HashMap;

/// 扁平化的属性集合，键使用点号分隔
pub type PropertyMap = HashMap<String, Value>;

/// 属性源 trait
///
/// 定义从不同数据源加载属性的统一接口
#[async_trait]
pub trait PropertySource: Send + Sync {
    /// 加载全部属性
    async fn load(&self) -> ConfigResult<PropertyMap>;

    /// 获取属性源名称
    fn name(&self) -> &str;

    /// 获取属性源优先级，数值越高越晚应用（覆盖低优先级的同名属性）
    fn priority(&self) -> i32 {
        0
    }
}
