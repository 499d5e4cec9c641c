//! # Configuration Abstractions
//!
//! 属性配置抽象层，定义属性加载的核心接口。
//!
//! ## 核心接口
//!
//! - [`PropertySource`] - 属性源接口
//! - [`PropertyMap`] - 扁平化属性集合

pub mod source;

pub use source::*;
