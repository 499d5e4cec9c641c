//! Koin 应用

use crate::logging::{init_logging, LoggingConfig};
use config_abstractions::{PropertyMap, PropertySource};
use config_impl::{file_property_source, EnvironmentPropertySource};
use di_abstractions::Module;
use di_impl::KoinContext;
use infrastructure_common::{ContextError, ContextResult, DependencyResult, LifecycleState};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Koin 应用
///
/// 持有一个 [`KoinContext`]，负责加载模块、属性和日志配置，并管理上下文的生命周期。
/// 所有配置方法都接受 `&self`，因此既可以在启动前配置，也可以在启动后通过全局句柄继续加载模块。
#[derive(Debug, Default)]
pub struct KoinApplication {
    koin: KoinContext,
    state: RwLock<LifecycleState>,
}

impl KoinApplication {
    /// 创建新的应用
    pub fn init() -> Self {
        Self::default()
    }

    /// 加载模块，应用关闭后返回 [`ContextError::Closed`]
    pub fn modules(&self, modules: &[Module]) -> ContextResult<&Self> {
        self.load_modules(modules)?;
        Ok(self)
    }

    pub(crate) fn load_modules(&self, modules: &[Module]) -> ContextResult<usize> {
        // 持有状态读锁，避免与 close 交错
        let state = self.state.read();
        if state.is_closed() {
            warn!("应用已关闭，拒绝加载 {} 个模块", modules.len());
            return Err(ContextError::Closed);
        }
        Ok(self.koin.load_modules(modules)?)
    }

    /// 卸载模块
    pub fn unload_modules(&self, modules: &[Module]) -> &Self {
        self.koin.unload_modules(modules);
        self
    }

    /// 批量设置属性，同名属性被覆盖
    pub fn properties(&self, properties: PropertyMap) -> &Self {
        debug!("设置 {} 个属性", properties.len());
        self.koin.properties().extend(properties);
        self
    }

    /// 从属性源加载属性
    pub async fn load_properties(&self, source: &dyn PropertySource) -> ContextResult<&Self> {
        let properties = source.load().await?;
        info!("从 {} 加载 {} 个属性", source.name(), properties.len());
        Ok(self.properties(properties))
    }

    /// 从文件加载属性，按扩展名选择 TOML 或 JSON 格式
    pub async fn file_properties<P: AsRef<Path>>(&self, path: P) -> ContextResult<&Self> {
        self.load_properties(&*file_property_source(path)).await
    }

    /// 从带前缀的环境变量加载属性
    pub async fn environment_properties(&self, prefix: &str) -> ContextResult<&Self> {
        self.load_properties(&EnvironmentPropertySource::new(prefix))
            .await
    }

    /// 安装日志订阅者
    pub fn with_logging(&self, config: LoggingConfig) -> ContextResult<&Self> {
        init_logging(&config)?;
        Ok(self)
    }

    /// 创建所有标记为启动时创建的组件
    pub fn create_eager_instances(&self) -> DependencyResult<()> {
        self.koin.create_eager_instances()
    }

    /// 解析上下文
    pub fn koin(&self) -> &KoinContext {
        &self.koin
    }

    /// 获取指定类型的主组件
    pub fn get<T>(&self) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.koin.get()
    }

    /// 获取指定名称的组件
    pub fn get_named<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.koin.get_named(name)
    }

    /// 当前生命周期状态
    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    pub(crate) fn mark_running(&self) {
        *self.state.write() = LifecycleState::Running;
    }

    /// 关闭应用，删除所有实例并清空注册表，重复关闭无副作用
    pub fn close(&self) {
        {
            let mut state = self.state.write();
            if state.is_closed() {
                return;
            }
            *state = LifecycleState::Closed;
        }
        self.koin.close();
        info!("应用已关闭");
    }
}
