//! # 依赖注入具体实现
//!
//! 提供组件定义注册表、实例工厂、属性注册表和解析上下文的实现
//!
//! ```rust
//! use di_abstractions::Module;
//! use di_impl::KoinContext;
//! use std::sync::Arc;
//!
//! struct Logger;
//! struct Service {
//!     logger: Arc<Logger>,
//! }
//!
//! let module = Module::root()
//!     .single(|_| Ok(Logger))
//!     .single(|r| Ok(Service { logger: r.get()? }));
//!
//! let context = KoinContext::new();
//! context.load_modules(&[module]).unwrap();
//!
//! let service = context.get::<Service>().unwrap();
//! let logger = context.get::<Logger>().unwrap();
//! assert!(Arc::ptr_eq(&service.logger, &logger));
//! ```

pub mod context;
pub mod instance;
pub mod property;
pub mod registry;

pub use context::{KoinContext, ResolutionSession};
pub use instance::InstanceFactory;
pub use property::PropertyRegistry;
pub use registry::BeanRegistry;
