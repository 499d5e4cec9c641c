//! # Configuration Implementation
//!
//! 属性源的具体实现，为依赖注入容器提供属性。
//!
//! ## 主要组件
//!
//! - [`TomlPropertySource`] - TOML 文件属性源
//! - [`JsonPropertySource`] - JSON 文件属性源
//! - [`EnvironmentPropertySource`] - 环境变量属性源
//! - [`MapPropertySource`] - 内存属性源
//! - [`PropertySourceChain`] - 按优先级合并多个属性源

pub mod manager;
pub mod providers;

pub use manager::*;
pub use providers::*;

#[cfg(test)]
mod tests;
