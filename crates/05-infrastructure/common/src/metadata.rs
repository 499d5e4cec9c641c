//! 元数据定义
//!
//! 提供组件类型标识

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型键
///
/// 组件声明类型的不透明标识。相等性和哈希只取决于 `id`，
/// `name` 仅用于日志和错误信息。
#[derive(Clone, Copy)]
pub struct TypeKey {
    /// 类型ID
    id: TypeId,
    /// 完整类型名称
    name: &'static str,
}

impl TypeKey {
    /// 从类型获取类型键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 类型ID
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称（包含模块路径）
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &'static str {
        // 泛型参数中的路径保持原样
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
