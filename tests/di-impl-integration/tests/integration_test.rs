//! 全局上下文的集中集成测试
//!
//! 全局句柄是进程级的，所有测试通过 `GLOBAL_LOCK` 串行执行

use di_abstractions::Module;
use infrastructure_common::{ContextError, DependencyError};
use infrastructure_composition::{
    get_koin, load_koin_modules, start_koin, start_koin_with, stop_koin, unload_koin_modules,
    KoinApplication,
};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static GLOBAL_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// 获取全局锁并保证测试开始时没有已启动的应用
fn isolated() -> MutexGuard<'static, ()> {
    let guard = GLOBAL_LOCK.lock();
    stop_koin();
    guard
}

#[derive(Debug)]
struct Logger {
    id: usize,
}

struct Service {
    logger: Arc<Logger>,
}

struct A(#[allow(dead_code)] Arc<B>);
struct B(#[allow(dead_code)] Arc<A>);

fn logger_module(calls: Arc<AtomicUsize>) -> Module {
    Module::root().single(move |_| {
        Ok(Logger {
            id: calls.fetch_add(1, Ordering::SeqCst),
        })
    })
}

fn service_module() -> Module {
    Module::root().single(|r| Ok(Service { logger: r.get()? }))
}

#[test]
fn test_logger_service_scenario() {
    let _guard = isolated();
    let calls = Arc::new(AtomicUsize::new(0));

    let app = start_koin_with(|app| {
        app.modules(&[logger_module(calls.clone()), service_module()])?;
        Ok(())
    })
    .unwrap();

    let service = app.get::<Service>().unwrap();
    let logger = get_koin().unwrap().get::<Logger>().unwrap();

    assert!(Arc::ptr_eq(&service.logger, &logger));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    stop_koin();
}

#[test]
fn test_cycle_scenario_through_global() {
    let _guard = isolated();

    start_koin_with(|app| {
        app.modules(&[Module::root()
            .single(|r| Ok(A(r.get()?)))
            .single(|r| Ok(B(r.get()?)))])?;
        Ok(())
    })
    .unwrap();

    let err = get_koin().unwrap().get::<A>().err().unwrap();
    assert!(err.is_cyclic());

    // 循环失败后其他组件仍可解析
    load_koin_modules(&[logger_module(Arc::new(AtomicUsize::new(0)))]).unwrap();
    assert!(get_koin().unwrap().get::<Logger>().is_ok());

    stop_koin();
}

#[test]
fn test_lifecycle_errors() {
    let _guard = isolated();

    assert!(matches!(get_koin(), Err(ContextError::NotStarted)));
    assert!(matches!(
        load_koin_modules(&[service_module()]),
        Err(ContextError::NotStarted)
    ));
    assert!(matches!(
        unload_koin_modules(&[service_module()]),
        Err(ContextError::NotStarted)
    ));

    start_koin(KoinApplication::init()).unwrap();
    assert!(matches!(
        start_koin(KoinApplication::init()),
        Err(ContextError::AlreadyStarted)
    ));

    stop_koin();
    assert!(matches!(get_koin(), Err(ContextError::NotStarted)));
}

#[test]
fn test_release_and_unload_through_global() {
    let _guard = isolated();
    let calls = Arc::new(AtomicUsize::new(0));
    let modules = [logger_module(calls.clone())];

    start_koin(KoinApplication::init()).unwrap();
    load_koin_modules(&modules).unwrap();

    let app = get_koin().unwrap();
    let first = app.get::<Logger>().unwrap();
    assert_eq!(app.koin().release("root"), 1);
    let second = app.get::<Logger>().unwrap();
    assert_ne!(first.id, second.id);

    assert_eq!(unload_koin_modules(&modules).unwrap(), 1);
    assert!(matches!(
        app.get::<Logger>(),
        Err(DependencyError::NoDefinitionFound { .. })
    ));

    stop_koin();
}

#[test]
fn test_dry_run_surfaces_first_error() {
    let _guard = isolated();

    let app = start_koin_with(|app| {
        app.modules(&[service_module()])?;
        Ok(())
    })
    .unwrap();

    let err = app.koin().dry_run().unwrap_err();
    assert!(matches!(err, DependencyError::NoDefinitionFound { .. }));

    load_koin_modules(&[logger_module(Arc::new(AtomicUsize::new(0)))]).unwrap();
    assert!(app.koin().dry_run().is_ok());

    stop_koin();
}

#[test]
fn test_concurrent_first_access_through_global() {
    let _guard = isolated();
    let calls = Arc::new(AtomicUsize::new(0));

    start_koin_with(|app| {
        app.modules(&[logger_module(calls.clone()), service_module()])?;
        Ok(())
    })
    .unwrap();

    std::thread::scope(|scope| {
        for _ in 0..16 {
            scope.spawn(|| {
                let service = get_koin().unwrap().get::<Service>().unwrap();
                assert_eq!(service.logger.id, 0);
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    stop_koin();
}

#[tokio::test]
async fn test_file_properties_feed_factories() {
    let _guard = isolated();

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[logger]\nprefix = \"svc\"\nlevel = 3").unwrap();

    let app = KoinApplication::init();
    app.file_properties(file.path()).await.unwrap();
    app.modules(&[Module::root().single(|r| {
        let prefix: Option<String> = r.get_property("logger.prefix")?;
        let level: Option<u8> = r.get_property("logger.level")?;
        Ok(format!("{}:{}", prefix.unwrap_or_default(), level.unwrap_or_default()))
    })])
    .unwrap();

    let app = start_koin(app).unwrap();
    assert_eq!(app.get::<String>().unwrap().as_str(), "svc:3");

    // 类型不匹配的属性
    assert!(app.koin().get_property::<u8>("logger.prefix").is_err());
    assert_eq!(app.koin().get_property::<u8>("missing").unwrap(), None);

    stop_koin();
}
