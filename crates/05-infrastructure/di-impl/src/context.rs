//! 解析上下文
//!
//! [`KoinContext`] 组合注册表、实例工厂和属性注册表，对外提供组件获取入口。
//! 每次顶层获取都创建独立的 [`ResolutionSession`]，解析栈随会话在调用链中传递，
//! 并发的解析互不可见。工厂绕过解析器直接调用上下文时，会加入当前线程上
//! 同一上下文正在进行的会话，循环依赖仍能被检测到。

use crate::instance::InstanceFactory;
use crate::property::PropertyRegistry;
use crate::registry::BeanRegistry;
use di_abstractions::{
    downcast_instance, BeanDefinition, DependencyResolver, Instance, Module, ResolutionStack,
};
use infrastructure_common::{
    ConfigResult, DependencyError, DependencyResult, TypeKey,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 解析上下文
#[derive(Debug, Default)]
pub struct KoinContext {
    /// 组件定义注册表
    bean_registry: RwLock<BeanRegistry>,
    /// 属性注册表
    property_registry: PropertyRegistry,
    /// 实例工厂
    instance_factory: InstanceFactory,
}

impl KoinContext {
    /// 创建空上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指定类型的主组件
    pub fn get<T>(&self) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get_with(None)
    }

    /// 获取指定名称的组件
    pub fn get_named<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get_with(Some(name))
    }

    /// 获取组件，名称非空时按名称查找，否则按类型查找
    pub fn get_with<T>(&self, name: Option<&str>) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.session().get_with(name)
    }

    /// 创建新的解析会话
    pub fn session(&self) -> ResolutionSession<'_> {
        ResolutionSession::new(self)
    }

    /// 预先创建所有已注册的组件，返回遇到的第一个错误
    pub fn dry_run(&self) -> DependencyResult<()> {
        let definitions = self.bean_registry.read().definitions().to_vec();
        info!("预检组件定义: {} 个", definitions.len());
        self.instantiate_all(&definitions)
    }

    /// 创建所有标记为启动时创建的组件
    pub fn create_eager_instances(&self) -> DependencyResult<()> {
        let definitions = self.bean_registry.read().eager_definitions();
        if definitions.is_empty() {
            return Ok(());
        }
        info!("创建启动实例: {} 个", definitions.len());
        self.instantiate_all(&definitions)
    }

    /// 释放作用域内所有组件的缓存实例
    pub fn release(&self, scope_id: &str) -> usize {
        let definitions = self.bean_registry.read().definitions_from_scope(scope_id);
        let dropped = self.instance_factory.drop_all_instances(&definitions);
        info!("释放作用域 '{}': {} 个实例", scope_id, dropped);
        dropped
    }

    /// 加载模块，返回注册的定义数量
    ///
    /// 被覆盖定义的缓存实例会一并删除。出错时之前已注册的定义保留。
    pub fn load_modules(&self, modules: &[Module]) -> DependencyResult<usize> {
        let mut replaced: Vec<Uuid> = Vec::new();
        let result = register_modules(&mut self.bean_registry.write(), modules, &mut replaced);

        for id in replaced {
            self.instance_factory.drop_instance(id);
        }
        let count = result?;

        info!("已加载 {} 个模块, {} 个定义", modules.len(), count);
        Ok(count)
    }

    /// 卸载模块，删除其定义及缓存实例，返回移除的定义数量
    pub fn unload_modules(&self, modules: &[Module]) -> usize {
        let removed: Vec<Arc<BeanDefinition>> = {
            let mut registry = self.bean_registry.write();
            modules
                .iter()
                .flat_map(|module| module.definitions())
                .filter_map(|definition| registry.unregister(definition.id()))
                .collect()
        };

        self.instance_factory.drop_all_instances(&removed);
        info!("已卸载 {} 个模块, {} 个定义", modules.len(), removed.len());
        removed.len()
    }

    /// 读取属性并转换为指定类型
    pub fn get_property<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.property_registry.get_property(key)
    }

    /// 读取属性原始值
    pub fn get_property_value(&self, key: &str) -> Option<Value> {
        self.property_registry.get_property_value(key)
    }

    /// 设置属性
    pub fn set_property(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.property_registry.set_property(key, value);
    }

    /// 属性注册表
    pub fn properties(&self) -> &PropertyRegistry {
        &self.property_registry
    }

    /// 实例工厂
    pub fn instances(&self) -> &InstanceFactory {
        &self.instance_factory
    }

    /// 已注册的定义数量
    pub fn definition_count(&self) -> usize {
        self.bean_registry.read().len()
    }

    /// 关闭上下文：删除所有实例，清空注册表和属性
    pub fn close(&self) {
        let definitions = {
            let mut registry = self.bean_registry.write();
            let count = registry.len();
            registry.clear();
            count
        };
        self.instance_factory.clear();
        self.property_registry.clear();
        info!("上下文已关闭, 清理 {} 个定义", definitions);
    }

    fn instantiate_all(&self, definitions: &[Arc<BeanDefinition>]) -> DependencyResult<()> {
        for definition in definitions {
            self.session().resolve_definition(definition).map_err(|e| {
                warn!("创建组件失败: {}: {}", definition, e);
                e
            })?;
        }
        Ok(())
    }
}

fn register_modules(
    registry: &mut BeanRegistry,
    modules: &[Module],
    replaced: &mut Vec<Uuid>,
) -> DependencyResult<usize> {
    let mut count = 0;
    for module in modules {
        debug!("加载模块: {} ({} 个定义)", module.scope_id(), module.len());
        for definition in module.definitions() {
            if let Some(old) = registry.register(Arc::clone(definition), module.allows_override())? {
                replaced.push(old.id());
            }
            count += 1;
        }
    }
    Ok(count)
}

type SharedStack = Rc<RefCell<ResolutionStack>>;

thread_local! {
    /// 当前线程上各上下文正在使用的解析栈，以上下文地址为键
    static ACTIVE_STACKS: RefCell<HashMap<usize, SharedStack>> = RefCell::new(HashMap::new());
}

/// 解析会话
///
/// 持有一次顶层解析的解析栈。工厂通过会话（作为 [`DependencyResolver`]）
/// 或直接通过上下文请求依赖时都沿用同一个解析栈。会话不跨线程共享。
pub struct ResolutionSession<'a> {
    context: &'a KoinContext,
    stack: SharedStack,
    /// 是否为本线程上该上下文的最外层会话
    owner: bool,
}

impl<'a> ResolutionSession<'a> {
    fn new(context: &'a KoinContext) -> Self {
        let key = context as *const KoinContext as usize;
        ACTIVE_STACKS.with(|active| {
            let mut active = active.borrow_mut();
            match active.get(&key) {
                Some(stack) => Self {
                    context,
                    stack: Rc::clone(stack),
                    owner: false,
                },
                None => {
                    let stack: SharedStack = Rc::default();
                    active.insert(key, Rc::clone(&stack));
                    Self {
                        context,
                        stack,
                        owner: true,
                    }
                }
            }
        })
    }

    /// 获取指定类型的主组件
    pub fn get<T>(&self) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get_with(None)
    }

    /// 获取组件，名称非空时按名称查找
    pub fn get_with<T>(&self, name: Option<&str>) -> DependencyResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let instance = self.resolve(TypeKey::of::<T>(), name)?;
        downcast_instance::<T>(instance)
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.stack.borrow().depth()
    }

    /// 解析组件实例
    pub fn resolve(&self, key: TypeKey, name: Option<&str>) -> DependencyResult<Instance> {
        match name.filter(|n| !n.is_empty()) {
            Some(name) => self.resolve_instance(key, |registry| registry.search_by_name(name)),
            None => self.resolve_instance(key, |registry| registry.search_all(key)),
        }
    }

    fn resolve_definition(&self, definition: &Arc<BeanDefinition>) -> DependencyResult<Instance> {
        self.resolve_instance(definition.type_key(), |_| Ok(Arc::clone(definition)))
    }

    fn resolve_instance<F>(&self, key: TypeKey, lookup: F) -> DependencyResult<Instance>
    where
        F: FnOnce(&BeanRegistry) -> DependencyResult<Arc<BeanDefinition>>,
    {
        // 循环依赖在入栈前检测，出错时解析栈不变
        self.stack.borrow_mut().push(key)?;
        debug!("解析组件: {} (深度 {})", key, self.depth());

        let result = self.lookup_and_create(key, lookup);

        // 成功与失败路径都必须出栈
        self.stack.borrow_mut().pop(key)?;
        result
    }

    fn lookup_and_create<F>(&self, key: TypeKey, lookup: F) -> DependencyResult<Instance>
    where
        F: FnOnce(&BeanRegistry) -> DependencyResult<Arc<BeanDefinition>>,
    {
        // 调用工厂前释放注册表读锁，工厂会递归进入此处
        let definition = lookup(&self.context.bean_registry.read())?;
        if definition.type_key() != key {
            return Err(DependencyError::TypeMismatch {
                expected: key.name().to_string(),
                actual: definition.type_key().name().to_string(),
            });
        }
        self.context
            .instance_factory
            .retrieve_instance(&definition, self)
    }
}

impl Drop for ResolutionSession<'_> {
    fn drop(&mut self) {
        if self.owner {
            let key = self.context as *const KoinContext as usize;
            // 线程退出时 thread_local 可能已销毁
            let _ = ACTIVE_STACKS.try_with(|active| active.borrow_mut().remove(&key));
        }
    }
}

impl DependencyResolver for ResolutionSession<'_> {
    fn resolve_dependency(&self, key: TypeKey, name: Option<&str>) -> DependencyResult<Instance> {
        self.resolve(key, name)
    }

    fn property_value(&self, key: &str) -> Option<Value> {
        self.context.get_property_value(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Logger;

    #[derive(Debug)]
    struct Service {
        logger: Arc<Logger>,
    }

    struct A(#[allow(dead_code)] Arc<B>);
    struct B(#[allow(dead_code)] Arc<A>);

    fn context_with(modules: &[Module]) -> KoinContext {
        let context = KoinContext::new();
        context.load_modules(modules).unwrap();
        context
    }

    #[test]
    fn test_resolves_transitive_dependency() {
        let module = Module::root()
            .single(|_| Ok(Logger))
            .single(|r| Ok(Service { logger: r.get()? }));
        let context = context_with(&[module]);

        let session = context.session();
        let service = session.get::<Service>().unwrap();
        let logger = session.get::<Logger>().unwrap();

        assert!(Arc::ptr_eq(&service.logger, &logger));
        assert_eq!(session.depth(), 0);
    }

    #[test]
    fn test_cycle_is_detected_and_stack_unwound() {
        let module = Module::root()
            .single(|r| Ok(A(r.get()?)))
            .single(|r| Ok(B(r.get()?)));
        let context = context_with(&[module]);

        let session = context.session();
        let err = session.get::<A>().err().unwrap();
        match err {
            DependencyError::CyclicDependency {
                dependency_chain, ..
            } => assert_eq!(dependency_chain, "A -> B -> A"),
            other => panic!("意外的错误: {other:?}"),
        }
        assert_eq!(session.depth(), 0);
        assert_eq!(context.instances().instance_count(), 0);
    }

    #[test]
    fn test_missing_dependency_propagates_unchanged() {
        let module = Module::root().single(|r| Ok(Service { logger: r.get()? }));
        let context = context_with(&[module]);

        let session = context.session();
        let err = session.get::<Service>().unwrap_err();
        assert!(matches!(err, DependencyError::NoDefinitionFound { .. }));
        assert_eq!(session.depth(), 0);
    }

    #[test]
    fn test_named_lookup_checks_type() {
        let module = Module::root().single_named("main", |_| Ok(Logger));
        let context = context_with(&[module]);

        assert!(context.get_named::<Logger>("main").is_ok());
        assert!(matches!(
            context.get_named::<Service>("main"),
            Err(DependencyError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_name_falls_back_to_type_lookup() {
        let context = context_with(&[Module::root().single(|_| Ok(Logger))]);
        assert!(context.get_with::<Logger>(Some("")).is_ok());
    }

    #[test]
    fn test_release_scope_recreates_instances() {
        let module = Module::new("session").single(|_| Ok(Logger));
        let context = context_with(&[module]);

        let first = context.get::<Logger>().unwrap();
        assert_eq!(context.release("session"), 1);
        let second = context.get::<Logger>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_release_other_scope_keeps_instances() {
        let context = context_with(&[Module::root().single(|_| Ok(Logger))]);

        let first = context.get::<Logger>().unwrap();
        assert_eq!(context.release("session"), 0);
        let second = context.get::<Logger>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_dry_run_creates_each_singleton_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let logger_calls = calls.clone();
        let service_calls = calls.clone();
        let module = Module::root()
            .single(move |_| {
                logger_calls.fetch_add(1, Ordering::SeqCst);
                Ok(Logger)
            })
            .single(move |r| {
                service_calls.fetch_add(1, Ordering::SeqCst);
                Ok(Service { logger: r.get()? })
            });
        let context = context_with(&[module]);

        context.dry_run().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(context.instances().instance_count(), 2);
    }

    #[test]
    fn test_dry_run_surfaces_first_error() {
        let module = Module::root()
            .single(|r| Ok(A(r.get()?)))
            .single(|r| Ok(B(r.get()?)));
        let context = context_with(&[module]);

        assert!(context.dry_run().unwrap_err().is_cyclic());
    }

    #[test]
    fn test_unload_modules_removes_definitions_and_instances() {
        let module = Module::root().single(|_| Ok(Logger));
        let context = context_with(&[module.clone()]);
        context.get::<Logger>().unwrap();

        assert_eq!(context.unload_modules(&[module]), 1);
        assert_eq!(context.definition_count(), 0);
        assert_eq!(context.instances().instance_count(), 0);
        assert!(context.get::<Logger>().is_err());
    }

    #[test]
    fn test_override_drops_cached_instance() {
        let context = context_with(&[Module::root().single(|_| Ok(Logger))]);
        context.get::<Logger>().unwrap();

        let replacement = Module::root().allow_override(true).single(|_| Ok(Logger));
        context.load_modules(&[replacement]).unwrap();

        assert_eq!(context.definition_count(), 1);
        assert_eq!(context.instances().instance_count(), 0);
    }

    #[test]
    fn test_properties_visible_to_factories() {
        #[derive(Debug)]
        struct Endpoint(String);

        let context = context_with(&[Module::root().single(|r| {
            let url: Option<String> = r
                .get_property("endpoint.url")
                .map_err(|e| DependencyError::creation_failed("Endpoint", e))?;
            Ok(Endpoint(url.unwrap_or_default()))
        })]);
        context.set_property("endpoint.url", "http://localhost");

        assert_eq!(context.get::<Endpoint>().unwrap().0, "http://localhost");
        assert_eq!(context.get_property::<String>("missing").unwrap(), None);
    }

    #[test]
    fn test_close_clears_everything() {
        let context = context_with(&[Module::root().single(|_| Ok(Logger))]);
        context.set_property("key", 1);
        context.get::<Logger>().unwrap();

        context.close();
        assert_eq!(context.definition_count(), 0);
        assert_eq!(context.instances().instance_count(), 0);
        assert!(context.properties().is_empty());
    }
}
