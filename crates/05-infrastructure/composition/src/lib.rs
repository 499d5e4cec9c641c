//! # 应用组合层
//!
//! 将解析上下文、属性源和日志组合成可启动的应用，并提供进程级全局上下文。
//!
//! ## 主要功能
//!
//! - **应用**: [`KoinApplication`] 加载模块和属性，管理上下文生命周期
//! - **全局上下文**: [`GlobalContext`] 以及 [`start_koin`] 系列函数
//! - **日志**: [`LoggingConfig`] 显式安装 `tracing` 订阅者
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_abstractions::Module;
//! use infrastructure_composition::{start_koin_with, stop_koin, LoggingConfig};
//!
//! struct Repository;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = start_koin_with(|app| {
//!         app.with_logging(LoggingConfig::development())?
//!             .modules(&[Module::root().single(|_| Ok(Repository))])?;
//!         Ok(())
//!     })?;
//!
//!     let _repository = app.get::<Repository>()?;
//!
//!     stop_koin();
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod global;
pub mod logging;

// 重新导出主要类型
pub use application::KoinApplication;
pub use global::{
    get_koin, load_koin_modules, start_koin, start_koin_with, stop_koin, unload_koin_modules,
    GlobalContext,
};
pub use logging::{init_logging, LoggingConfig};
