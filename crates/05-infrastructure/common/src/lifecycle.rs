//! 组件生命周期管理

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// 单例模式 - 在上下文内只创建一个实例，直到被释放
    #[default]
    Singleton,
    /// 瞬时模式 - 每次请求都创建新实例
    Transient,
}

impl Lifetime {
    /// 实例是否需要缓存
    pub fn is_cached(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

/// 应用生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// 已创建，尚未启动
    #[default]
    Created,
    /// 运行中
    Running,
    /// 已关闭
    Closed,
}

impl LifecycleState {
    /// 是否已关闭
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}
