//! 错误类型定义

use thiserror::Error;

/// 属性配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置类型转换失败: {key}, 原因: {message}")]
    TypeConversionError { key: String, message: String },
}

/// 依赖注入错误类型
///
/// 嵌套解析中产生的错误原样传递给最外层调用者，不做包装。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("未找到组件定义: {target}")]
    NoDefinitionFound { target: String },

    #[error("组件定义不唯一: {type_name}, 候选: {candidates:?}")]
    AmbiguousDefinition {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("检测到循环依赖: {type_name}, 解析链: {dependency_chain}")]
    CyclicDependency {
        type_name: String,
        dependency_chain: String,
    },

    #[error("解析栈已损坏: 栈顶为 {actual}, 应为 {expected}")]
    StackCorruption { expected: String, actual: String },

    #[error("组件定义重复: {definition}")]
    DuplicateDefinition { definition: String },

    #[error("组件类型不匹配: 期望 {expected}, 定义类型 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("组件属性读取失败: {source}")]
    Property {
        #[from]
        source: ConfigError,
    },
}

impl DependencyError {
    /// 创建组件创建失败错误
    pub fn creation_failed(
        type_name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 是否为循环依赖错误
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }
}

/// 应用上下文错误类型
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("应用尚未启动")]
    NotStarted,

    #[error("应用已经启动")]
    AlreadyStarted,

    #[error("应用已关闭")]
    Closed,

    #[error("依赖注入错误: {source}")]
    Dependency {
        #[from]
        source: DependencyError,
    },

    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("日志初始化失败: {message}")]
    LoggingInitFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type ContextResult<T> = Result<T, ContextError>;
