//! 生命周期集成测试：初始化/销毁顺序、部分失败与尽力销毁

use ioc_common::{
    Component, ComponentDescriptor, ContextError, HookResult, Initializer, LifecyclePhase,
    LifecycleState, PostConstruct,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use support::{recording_context, Journal, MemoryUserRepository, Step, UserService};

static SESSION_INITS: AtomicU32 = AtomicU32::new(0);

/// 带初始化回调的原型组件
#[derive(Default)]
struct Session {
    ready: AtomicBool,
    post_constructed: AtomicBool,
}

impl Initializer for Session {
    fn init(&self) -> HookResult {
        SESSION_INITS.fetch_add(1, Ordering::SeqCst);
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl PostConstruct for Session {
    fn post_construct(&self) -> HookResult {
        self.post_constructed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Component for Session {
    fn describe() -> ComponentDescriptor {
        ComponentDescriptor::builder::<Self>()
            .name("session")
            .initializer()
            .post_construct()
            .prototype()
            .build()
    }
}

/// 初始化总是失败的原型组件
#[derive(Default)]
struct BrokenSession;

impl Initializer for BrokenSession {
    fn init(&self) -> HookResult {
        Err("会话初始化失败".into())
    }
}

impl Component for BrokenSession {
    fn describe() -> ComponentDescriptor {
        ComponentDescriptor::builder::<Self>()
            .initializer()
            .prototype()
            .build()
    }
}

#[test]
fn test_init_and_destroy_ordering() -> anyhow::Result<()> {
    let (ctx, _) = recording_context();
    let journal = Arc::new(Journal::default());
    for name in ["a", "b", "c"] {
        ctx.register_singleton(name, Arc::new(Step::new(journal.clone())))?;
    }

    ctx.start()?;
    assert_eq!(ctx.init_order(), vec!["a", "b", "c"]);

    let report = ctx.stop()?;
    assert!(report.is_clean());
    assert_eq!(ctx.destroy_order(), vec!["c", "b", "a"]);
    assert_eq!(report.destroyed, vec!["c", "b", "a"]);
    assert_eq!(
        journal.entries(),
        vec![
            "a.init",
            "b.init",
            "c.init",
            "c.pre_destroy",
            "c.destroy",
            "b.pre_destroy",
            "b.destroy",
            "a.pre_destroy",
            "a.destroy",
        ]
    );
    Ok(())
}

#[test]
fn test_partial_initialization_failure() -> anyhow::Result<()> {
    let (ctx, _) = recording_context();
    let journal = Arc::new(Journal::default());
    ctx.register_singleton("a", Arc::new(Step::new(journal.clone())))?;
    ctx.register_singleton("b", Arc::new(Step::failing_init(journal.clone())))?;
    ctx.register_singleton("c", Arc::new(Step::new(journal.clone())))?;

    let err = ctx.start().unwrap_err();

    match &err {
        ContextError::Initialization { bean, source } => {
            assert_eq!(bean, "b");
            assert_eq!(source.phase(), LifecyclePhase::Init);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("'b'"));
    assert_eq!(ctx.init_order(), vec!["a"]);
    assert_eq!(journal.entries(), vec!["a.init", "b.init"]);
    assert!(!ctx.is_started());

    let state = |name: &str| ctx.get_bean_definition(name).map(|r| r.state);
    assert_eq!(state("a"), Some(LifecycleState::Ready));
    assert_eq!(state("b"), Some(LifecycleState::Failed));
    assert_eq!(state("c"), Some(LifecycleState::Registered));
    Ok(())
}

#[test]
fn test_destroy_is_best_effort() -> anyhow::Result<()> {
    let (ctx, _) = recording_context();
    let journal = Arc::new(Journal::default());
    ctx.register_singleton("a", Arc::new(Step::new(journal.clone())))?;
    ctx.register_singleton("b", Arc::new(Step::failing_destroy(journal.clone())))?;

    ctx.start()?;
    let report = ctx.stop()?;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].bean(), "b");
    assert_eq!(report.failures[0].phase(), LifecyclePhase::PreDestroy);
    assert_eq!(report.destroyed, vec!["a"]);

    // b 的主销毁回调被跳过，a 的销毁回调仍然执行
    let entries = journal.entries();
    assert!(!entries.contains(&"b.destroy".to_string()));
    assert!(entries.contains(&"a.destroy".to_string()));
    assert_eq!(ctx.destroy_order(), vec!["b", "a"]);
    assert!(ctx.list_beans().is_empty());
    Ok(())
}

#[test]
fn test_repository_service_scenario() -> anyhow::Result<()> {
    let (ctx, _) = recording_context();
    let journal = Arc::new(Journal::default());
    let repo = Arc::new(MemoryUserRepository::new(journal.clone()));
    let svc = Arc::new(UserService::new(journal.clone()));

    ctx.register_singleton("repo", Arc::clone(&repo))?;
    ctx.register_singleton("svc", Arc::clone(&svc))?;
    ctx.start()?;

    let injected = svc.repository.get().unwrap();
    assert!(Arc::ptr_eq(&injected, &repo));
    assert_eq!(svc.user_name(1).as_deref(), Some("alice"));
    assert_eq!(ctx.init_order(), vec!["repo", "svc"]);

    ctx.stop()?;
    assert_eq!(ctx.destroy_order(), vec!["svc", "repo"]);
    assert_eq!(
        journal.entries(),
        vec!["repo.init", "svc.init", "svc.destroy", "repo.destroy"]
    );
    Ok(())
}

#[test]
fn test_bean_name_awareness() -> anyhow::Result<()> {
    let (ctx, _) = recording_context();
    let journal = Arc::new(Journal::default());
    ctx.register_singleton("first-step", Arc::new(Step::new(journal.clone())))?;

    ctx.start()?;

    assert_eq!(journal.entries(), vec!["first-step.init"]);
    Ok(())
}

#[test]
fn test_lifecycle_events_are_emitted() -> anyhow::Result<()> {
    let (ctx, sink) = recording_context();
    let journal = Arc::new(Journal::default());
    ctx.register_singleton("repo", Arc::new(MemoryUserRepository::new(journal.clone())))?;
    ctx.register_singleton("svc", Arc::new(UserService::new(journal)))?;

    ctx.start()?;
    ctx.stop()?;

    assert_eq!(sink.count("context_starting"), 1);
    assert_eq!(sink.count("context_started"), 1);
    assert_eq!(sink.count("dependency_injected"), 1);
    assert_eq!(sink.count("lifecycle_starting"), 2);
    assert_eq!(sink.count("lifecycle_started"), 2);
    assert_eq!(sink.count("lifecycle_stopped"), 2);
    assert_eq!(sink.count("component_destroyed"), 2);

    let names = sink.names();
    let started = names.iter().position(|n| *n == "context_started").unwrap();
    let stopping = names.iter().position(|n| *n == "context_stopping").unwrap();
    assert!(started < stopping);
    assert_eq!(names.last(), Some(&"context_stopped"));
    Ok(())
}

#[test]
fn test_prototypes_are_initialized() -> anyhow::Result<()> {
    let (ctx, _) = recording_context();
    let journal = Arc::new(Journal::default());
    ctx.register_singleton("a", Arc::new(Step::new(journal.clone())))?;
    ctx.register_prototype("session", Arc::new(Session::default()))?;
    ctx.register_singleton("b", Arc::new(Step::new(journal)))?;

    ctx.start()?;

    // 启动时按注册顺序为原型创建并初始化一个实例
    assert_eq!(ctx.init_order(), vec!["a", "session", "b"]);
    assert_eq!(SESSION_INITS.load(Ordering::SeqCst), 1);
    assert_eq!(
        ctx.get_bean_definition("session").map(|r| r.state),
        Some(LifecycleState::Ready)
    );

    let session = ctx.get_bean_as::<Session>("session").unwrap();
    assert!(session.ready.load(Ordering::SeqCst));
    assert!(session.post_constructed.load(Ordering::SeqCst));
    assert_eq!(SESSION_INITS.load(Ordering::SeqCst), 2);

    ctx.stop()?;
    assert_eq!(ctx.destroy_order(), vec!["b", "a"]);
    Ok(())
}

#[test]
fn test_prototype_init_failure_aborts_start() -> anyhow::Result<()> {
    let (ctx, _) = recording_context();
    let journal = Arc::new(Journal::default());
    ctx.register_singleton("a", Arc::new(Step::new(journal)))?;
    ctx.register_prototype("broken", Arc::new(BrokenSession))?;

    let err = ctx.start().unwrap_err();

    match &err {
        ContextError::Initialization { bean, source } => {
            assert_eq!(bean, "broken");
            assert_eq!(source.phase(), LifecyclePhase::Init);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ctx.is_started());
    assert_eq!(ctx.init_order(), vec!["a"]);
    assert_eq!(
        ctx.get_bean_definition("broken").map(|r| r.state),
        Some(LifecycleState::Failed)
    );
    assert!(ctx.get_bean("broken").is_none());
    Ok(())
}
