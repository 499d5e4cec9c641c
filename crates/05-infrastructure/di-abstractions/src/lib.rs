//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件定义、模块和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`BeanDefinition`] - 组件定义
//! - [`Module`] - 组件模块
//! - [`DependencyResolver`] - 依赖解析器接口
//! - [`ResolutionStack`] - 循环依赖检测用的解析栈

pub mod definition;
pub mod factory;
pub mod module;
pub mod resolver;

pub use definition::*;
pub use factory::*;
pub use module::*;
pub use resolver::*;
