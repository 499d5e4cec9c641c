//! # Infrastructure Common
//!
//! 这个 crate 提供了依赖注入核心的公共类型。
//!
//! ## 核心类型
//!
//! - [`TypeKey`] - 组件声明类型的标识
//! - [`Lifetime`] - 组件实例的生命周期
//! - [`LifecycleState`] - 应用生命周期状态
//! - [`DependencyError`] / [`ContextError`] / [`ConfigError`] - 错误类型

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
