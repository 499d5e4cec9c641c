//! 属性源链实现

use async_trait::async_trait;
use config_abstractions::{PropertyMap, PropertySource};
use infrastructure_common::ConfigResult;
use tracing::{debug, info};

/// 属性源链
///
/// 协调多个属性源，按优先级合并为一份属性表。优先级高的属性源覆盖优先级低的同名键。
/// 属性源链本身也是属性源，可以整体交给应用加载
#[derive(Default)]
pub struct PropertySourceChain {
    /// 属性源列表（按优先级升序）
    sources: Vec<Box<dyn PropertySource>>,
}

impl std::fmt::Debug for PropertySourceChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertySourceChain")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PropertySourceChain {
    /// 创建空的属性源链
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加属性源
    pub fn add_source(&mut self, source: Box<dyn PropertySource>) {
        debug!(
            "添加属性源: {} (优先级: {})",
            source.name(),
            source.priority()
        );
        self.sources.push(source);
        // 稳定排序，同优先级保持添加顺序，后添加的覆盖先添加的
        self.sources.sort_by_key(|s| s.priority());
    }

    /// 链式添加属性源
    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.add_source(Box::new(source));
        self
    }

    /// 属性源数量
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// 依次加载所有属性源并合并
    ///
    /// 任一属性源加载失败时立即返回错误
    pub async fn load_all(&self) -> ConfigResult<PropertyMap> {
        let mut merged = PropertyMap::new();
        for source in &self.sources {
            let properties = source.load().await?;
            debug!("属性源 {} 提供 {} 个属性", source.name(), properties.len());
            merged.extend(properties);
        }
        info!(
            "属性源链加载完成: {} 个属性源, {} 个属性",
            self.sources.len(),
            merged.len()
        );
        Ok(merged)
    }
}

#[async_trait]
impl PropertySource for PropertySourceChain {
    async fn load(&self) -> ConfigResult<PropertyMap> {
        self.load_all().await
    }

    fn name(&self) -> &str {
        "PropertySourceChain"
    }

    fn priority(&self) -> i32 {
        self.sources.last().map_or(0, |s| s.priority())
    }
}
