//! 全局应用上下文
//!
//! 进程内最多持有一个已启动的 [`KoinApplication`]。启动、停止、加载和卸载模块
//! 在同一把可重入锁下串行执行；读取句柄只需要短暂的读锁。

use crate::application::KoinApplication;
use di_abstractions::Module;
use infrastructure_common::{ContextError, ContextResult};
use once_cell::sync::Lazy;
use parking_lot::{ReentrantMutex, RwLock};
use std::sync::Arc;
use tracing::{info, warn};

/// 全局应用上下文
#[derive(Debug, Default)]
pub struct GlobalContext {
    /// 当前应用句柄
    handle: RwLock<Option<Arc<KoinApplication>>>,
    /// 生命周期锁，可重入以允许工厂在启动期间回调全局上下文
    lifecycle: ReentrantMutex<()>,
}

static GLOBAL_CONTEXT: Lazy<GlobalContext> = Lazy::new(GlobalContext::new);

impl GlobalContext {
    /// 创建独立的上下文实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程级全局上下文
    pub fn global() -> &'static Self {
        &GLOBAL_CONTEXT
    }

    /// 获取当前应用，未启动时返回 [`ContextError::NotStarted`]
    pub fn get(&self) -> ContextResult<Arc<KoinApplication>> {
        self.get_or_null().ok_or(ContextError::NotStarted)
    }

    /// 获取当前应用
    pub fn get_or_null(&self) -> Option<Arc<KoinApplication>> {
        self.handle.read().clone()
    }

    /// 是否已启动
    pub fn is_started(&self) -> bool {
        self.handle.read().is_some()
    }

    /// 启动已配置好的应用
    pub fn start(&self, application: KoinApplication) -> ContextResult<Arc<KoinApplication>> {
        self.start_with_application(application, |_| Ok(()))
    }

    /// 创建新应用，执行声明后启动
    ///
    /// 声明执行前句柄已经设置，声明中的工厂可以访问全局上下文。
    /// 声明或启动实例创建失败时句柄被清除，应用被关闭。
    pub fn start_with<F>(&self, declaration: F) -> ContextResult<Arc<KoinApplication>>
    where
        F: FnOnce(&KoinApplication) -> ContextResult<()>,
    {
        self.start_with_application(KoinApplication::init(), declaration)
    }

    fn start_with_application<F>(
        &self,
        application: KoinApplication,
        declaration: F,
    ) -> ContextResult<Arc<KoinApplication>>
    where
        F: FnOnce(&KoinApplication) -> ContextResult<()>,
    {
        let _guard = self.lifecycle.lock();

        let application = {
            let mut handle = self.handle.write();
            if handle.is_some() {
                warn!("应用已经启动，忽略重复启动");
                return Err(ContextError::AlreadyStarted);
            }
            let application = Arc::new(application);
            *handle = Some(Arc::clone(&application));
            application
        };

        let started = declaration(&application)
            .and_then(|()| application.create_eager_instances().map_err(ContextError::from));

        if let Err(e) = started {
            warn!("应用启动失败，回滚: {}", e);
            self.clear_handle(&application);
            application.close();
            return Err(e);
        }

        application.mark_running();
        info!(
            "应用已启动: {} 个定义",
            application.koin().definition_count()
        );
        Ok(application)
    }

    /// 停止当前应用，未启动时无操作
    pub fn stop(&self) {
        let _guard = self.lifecycle.lock();

        let application = self.handle.write().take();
        if let Some(application) = application {
            application.close();
            info!("应用已停止");
        }
    }

    /// 向当前应用加载模块
    pub fn load_modules(&self, modules: &[Module]) -> ContextResult<usize> {
        let _guard = self.lifecycle.lock();
        let application = self.get()?;
        let count = application.load_modules(modules)?;
        application.create_eager_instances()?;
        Ok(count)
    }

    /// 从当前应用卸载模块
    pub fn unload_modules(&self, modules: &[Module]) -> ContextResult<usize> {
        let _guard = self.lifecycle.lock();
        Ok(self.get()?.koin().unload_modules(modules))
    }

    fn clear_handle(&self, application: &Arc<KoinApplication>) {
        let mut handle = self.handle.write();
        if handle
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, application))
        {
            *handle = None;
        }
    }
}

/// 启动全局应用
pub fn start_koin(application: KoinApplication) -> ContextResult<Arc<KoinApplication>> {
    GlobalContext::global().start(application)
}

/// 以声明方式启动全局应用
///
/// ```rust
/// use di_abstractions::Module;
/// use infrastructure_composition::{start_koin_with, stop_koin};
///
/// struct Clock;
///
/// let app = start_koin_with(|app| {
///     app.modules(&[Module::root().single(|_| Ok(Clock))])?;
///     Ok(())
/// })
/// .unwrap();
///
/// assert!(app.get::<Clock>().is_ok());
/// stop_koin();
/// ```
pub fn start_koin_with<F>(declaration: F) -> ContextResult<Arc<KoinApplication>>
where
    F: FnOnce(&KoinApplication) -> ContextResult<()>,
{
    GlobalContext::global().start_with(declaration)
}

/// 停止全局应用
pub fn stop_koin() {
    GlobalContext::global().stop();
}

/// 向全局应用加载模块
pub fn load_koin_modules(modules: &[Module]) -> ContextResult<usize> {
    GlobalContext::global().load_modules(modules)
}

/// 从全局应用卸载模块
pub fn unload_koin_modules(modules: &[Module]) -> ContextResult<usize> {
    GlobalContext::global().unload_modules(modules)
}

/// 获取全局应用
pub fn get_koin() -> ContextResult<Arc<KoinApplication>> {
    GlobalContext::global().get()
}
