//! 应用上下文集成测试：启停状态、注入策略、组件注册与事件接收器

use ioc_common::{
    Autowired, Component, ComponentDescriptor, ContainerConfig, ContainerEvent, ContextError,
    EventSink, InjectionError, InjectionPolicy, MultiSink, RecordingSink, Scope, SinkKind,
};
use ioc_container::ApplicationContext;
use std::sync::Arc;
use support::{
    recording_context, Journal, MemoryUserRepository, ReportService, RequestHandler, UserService,
};

#[derive(Default)]
struct AuditLog {
    required: Autowired<MemoryUserRepository>,
    optional: Autowired<ReportService>,
}

impl Component for AuditLog {
    fn describe() -> ComponentDescriptor {
        ComponentDescriptor::builder::<Self>()
            .name("audit")
            .inject_by_name("required", "repo", |a| &a.required)
            .optional_by_type("optional", |a| &a.optional)
            .build()
    }
}

struct PanickingSink;

impl EventSink for PanickingSink {
    fn log_event(&self, _event: &ContainerEvent) {
        panic!("sink is broken");
    }
}

#[test]
fn test_start_twice_and_stop_without_start() -> anyhow::Result<()> {
    let (ctx, _) = recording_context();

    assert!(matches!(ctx.stop(), Err(ContextError::NotStarted)));
    ctx.start()?;
    assert!(matches!(ctx.start(), Err(ContextError::AlreadyStarted)));
    ctx.stop()?;
    assert!(matches!(ctx.stop(), Err(ContextError::NotStarted)));
    Ok(())
}

#[test]
fn test_lenient_policy_leaves_fields_empty() -> anyhow::Result<()> {
    let (ctx, sink) = recording_context();
    let audit = Arc::new(AuditLog::default());
    ctx.register_singleton("audit", Arc::clone(&audit))?;

    ctx.start()?;

    assert!(!audit.required.is_wired());
    assert!(!audit.optional.is_wired());
    assert_eq!(sink.count("dependency_injection_failed"), 2);
    Ok(())
}

#[test]
fn test_strict_policy_rejects_missing_required_dependency() -> anyhow::Result<()> {
    let ctx = ApplicationContext::builder()
        .with_injection_policy(InjectionPolicy::Strict)
        .with_sink(Arc::new(RecordingSink::new()))
        .build();
    ctx.register_singleton("audit", Arc::new(AuditLog::default()))?;

    let err = ctx.start().unwrap_err();

    match err {
        ContextError::Wiring {
            source: InjectionError::BeanWiring { bean, source },
        } => {
            assert_eq!(bean, "audit");
            assert!(matches!(*source, InjectionError::Unresolved { ref field, .. } if field == "required"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ctx.is_started());
    Ok(())
}

#[test]
fn test_strict_policy_accepts_missing_optional_dependency() -> anyhow::Result<()> {
    let config = ContainerConfig::default()
        .with_injection_policy(InjectionPolicy::Strict)
        .with_sink(SinkKind::None);
    let ctx = ApplicationContext::builder().with_config(config).build();

    let journal = Arc::new(Journal::default());
    ctx.register_singleton("repo", Arc::new(MemoryUserRepository::new(journal)))?;
    let audit = Arc::new(AuditLog::default());
    ctx.register_singleton("audit", Arc::clone(&audit))?;

    ctx.start()?;

    assert!(audit.required.is_wired());
    assert!(!audit.optional.is_wired());
    Ok(())
}

#[test]
fn test_register_components_by_convention() -> anyhow::Result<()> {
    let (ctx, _) = recording_context();
    let registry = ctx.registry();
    let journal = Arc::new(Journal::default());

    let names = ctx.register_components([
        registry.instance_of(Arc::new(MemoryUserRepository::new(journal.clone()))),
        registry.instance_of(Arc::new(UserService::new(journal))),
        registry.instance_of(Arc::new(ReportService::default())),
        registry.instance_of(Arc::new(RequestHandler::default())),
    ])?;

    assert_eq!(names, vec!["repo", "svc", "reportservice", "handler"]);
    assert_eq!(
        ctx.get_bean_definition("handler").map(|r| r.scope),
        Some(Scope::Prototype)
    );

    let err = ctx
        .register_component(Arc::new(ReportService::default()))
        .unwrap_err();
    assert!(matches!(err, ContextError::Registry { .. }));
    Ok(())
}

#[test]
fn test_create_bean_and_autowire() -> anyhow::Result<()> {
    let (ctx, _) = recording_context();
    let journal = Arc::new(Journal::default());
    ctx.create_bean("repo", || Arc::new(MemoryUserRepository::new(journal.clone())))?;

    // 未注册的实例也可以装配
    let svc = Arc::new(UserService::new(journal));
    let report = ctx.autowire(&svc)?;

    assert!(report.is_complete());
    assert_eq!(report.injected, vec!["repository"]);
    assert_eq!(svc.user_name(2).as_deref(), Some("bob"));
    assert!(!ctx.has_bean("svc"));
    Ok(())
}

#[test]
fn test_refresh_restarts_with_cleared_registry() -> anyhow::Result<()> {
    let (ctx, sink) = recording_context();
    let journal = Arc::new(Journal::default());
    ctx.register_singleton("repo", Arc::new(MemoryUserRepository::new(journal.clone())))?;

    ctx.refresh()?;
    assert!(ctx.is_started());
    assert_eq!(ctx.init_order(), vec!["repo"]);

    ctx.refresh()?;
    assert!(ctx.is_started());
    assert!(ctx.list_beans().is_empty());
    assert!(ctx.init_order().is_empty());
    assert_eq!(journal.entries(), vec!["repo.init", "repo.destroy"]);
    assert_eq!(sink.count("context_started"), 2);
    Ok(())
}

#[test]
fn test_panicking_sink_does_not_abort_operations() -> anyhow::Result<()> {
    let recorder = Arc::new(RecordingSink::new());
    let sink = MultiSink::new()
        .with(Arc::new(PanickingSink))
        .with(recorder.clone());
    let ctx = ApplicationContext::builder()
        .with_sink(Arc::new(PanickingSink))
        .build();
    let journal = Arc::new(Journal::default());

    ctx.register_singleton("repo", Arc::new(MemoryUserRepository::new(journal.clone())))?;
    ctx.start()?;
    ctx.stop()?;
    assert_eq!(journal.entries(), vec!["repo.init", "repo.destroy"]);

    let observed = ApplicationContext::builder().with_sink(Arc::new(sink)).build();
    observed.register_singleton("repo", Arc::new(MemoryUserRepository::new(journal)))?;
    observed.start()?;
    assert_eq!(recorder.count("context_started"), 1);
    Ok(())
}

#[test]
fn test_context_ids_are_unique() {
    let first = ApplicationContext::new();
    let second = ApplicationContext::new();
    assert_ne!(first.id(), second.id());
}
