//! 组件定义注册表

use di_abstractions::BeanDefinition;
use infrastructure_common::{DependencyError, DependencyResult, TypeKey};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// 组件定义注册表
///
/// 名称在整个注册表内唯一；每个类型最多有一个未命名（主）定义。
/// 注册表本身不加锁，由 [`crate::KoinContext`] 负责同步。
#[derive(Debug, Default)]
pub struct BeanRegistry {
    /// 按注册顺序保存的定义
    definitions: Vec<Arc<BeanDefinition>>,
    /// 名称索引
    by_name: HashMap<String, Arc<BeanDefinition>>,
    /// 类型索引
    by_type: HashMap<TypeKey, Vec<Arc<BeanDefinition>>>,
}

impl BeanRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册组件定义
    ///
    /// 与已有定义冲突（同名，或同类型的第二个主定义）时：允许覆盖则替换并返回被替换的定义，
    /// 否则返回 [`DependencyError::DuplicateDefinition`]。同一定义重复注册不产生任何效果。
    pub fn register(
        &mut self,
        definition: Arc<BeanDefinition>,
        allow_override: bool,
    ) -> DependencyResult<Option<Arc<BeanDefinition>>> {
        let replaced = match self.find_conflict(&definition) {
            Some(existing) if existing.id() == definition.id() => {
                debug!("组件定义已注册，跳过: {}", definition);
                return Ok(None);
            }
            Some(existing) if !allow_override => {
                return Err(DependencyError::DuplicateDefinition {
                    definition: format!("{} 与已有定义 {} 冲突", definition, existing),
                });
            }
            Some(existing) => {
                warn!("覆盖组件定义: {} -> {}", existing, definition);
                self.unregister(existing.id())
            }
            None => None,
        };

        debug!("注册组件定义: {}", definition);
        if let Some(name) = definition.name() {
            self.by_name.insert(name.to_string(), definition.clone());
        }
        self.by_type
            .entry(definition.type_key())
            .or_default()
            .push(definition.clone());
        self.definitions.push(definition);

        Ok(replaced)
    }

    /// 移除组件定义
    pub fn unregister(&mut self, id: Uuid) -> Option<Arc<BeanDefinition>> {
        let index = self.definitions.iter().position(|d| d.id() == id)?;
        let definition = self.definitions.remove(index);

        if let Some(name) = definition.name() {
            self.by_name.remove(name);
        }
        if let Some(candidates) = self.by_type.get_mut(&definition.type_key()) {
            candidates.retain(|d| d.id() != id);
            if candidates.is_empty() {
                self.by_type.remove(&definition.type_key());
            }
        }

        debug!("移除组件定义: {}", definition);
        Some(definition)
    }

    /// 按名称查找定义
    pub fn search_by_name(&self, name: &str) -> DependencyResult<Arc<BeanDefinition>> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| DependencyError::NoDefinitionFound {
                target: format!("name '{}'", name),
            })
    }

    /// 按类型查找定义
    ///
    /// 只有一个候选时直接返回；多个候选时返回未命名的主定义，
    /// 没有主定义则视为不唯一。
    pub fn search_all(&self, type_key: TypeKey) -> DependencyResult<Arc<BeanDefinition>> {
        let candidates = match self.by_type.get(&type_key) {
            Some(candidates) if !candidates.is_empty() => candidates,
            _ => {
                return Err(DependencyError::NoDefinitionFound {
                    target: format!("type {}", type_key),
                })
            }
        };

        if let [only] = candidates.as_slice() {
            return Ok(only.clone());
        }

        let mut primaries = candidates.iter().filter(|d| d.is_primary());
        match (primaries.next(), primaries.next()) {
            (Some(primary), None) => Ok(primary.clone()),
            _ => Err(DependencyError::AmbiguousDefinition {
                type_name: type_key.name().to_string(),
                candidates: candidates.iter().map(|d| d.to_string()).collect(),
            }),
        }
    }

    /// 获取作用域内的所有定义
    pub fn definitions_from_scope(&self, scope_id: &str) -> Vec<Arc<BeanDefinition>> {
        self.definitions
            .iter()
            .filter(|d| d.scope_id() == scope_id)
            .cloned()
            .collect()
    }

    /// 需要在启动时创建的定义
    pub fn eager_definitions(&self) -> Vec<Arc<BeanDefinition>> {
        self.definitions
            .iter()
            .filter(|d| d.is_created_at_start())
            .cloned()
            .collect()
    }

    /// 所有定义（按注册顺序）
    pub fn definitions(&self) -> &[Arc<BeanDefinition>] {
        &self.definitions
    }

    /// 是否包含指定定义
    pub fn contains(&self, id: Uuid) -> bool {
        self.definitions.iter().any(|d| d.id() == id)
    }

    /// 定义数量
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// 清理所有定义
    pub fn clear(&mut self) {
        self.definitions.clear();
        self.by_name.clear();
        self.by_type.clear();
    }

    fn find_conflict(&self, definition: &BeanDefinition) -> Option<Arc<BeanDefinition>> {
        match definition.name() {
            Some(name) => self.by_name.get(name).cloned(),
            None => self
                .by_type
                .get(&definition.type_key())
                .and_then(|candidates| candidates.iter().find(|d| d.is_primary()).cloned()),
        }
    }
}
