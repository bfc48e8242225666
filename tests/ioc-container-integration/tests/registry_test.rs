//! 注册表集成测试：名称唯一性、单例同一性、原型独立性与类型解析

use ioc_common::{RegistryError, Scope, TypeInfo};
use ioc_container::Registry;
use std::sync::Arc;
use support::{
    Journal, MemoryUserRepository, ReportService, RequestHandler, UserRepository,
};

fn registry() -> Registry {
    Registry::with_sink(Arc::new(ioc_common::NopSink))
}

#[test]
fn test_duplicate_name_keeps_original() -> anyhow::Result<()> {
    let registry = registry();
    let journal = Arc::new(Journal::default());
    let original = Arc::new(MemoryUserRepository::new(journal.clone()));

    registry.register_singleton("repo", Arc::clone(&original))?;
    let err = registry
        .register_singleton("repo", Arc::new(MemoryUserRepository::new(journal)))
        .unwrap_err();

    assert!(matches!(err, RegistryError::DuplicateName { .. }));
    let resolved = registry.get_bean_as::<MemoryUserRepository>("repo").unwrap();
    assert!(Arc::ptr_eq(&resolved, &original));
    Ok(())
}

#[test]
fn test_singleton_identity() -> anyhow::Result<()> {
    let registry = registry();
    let repo = Arc::new(MemoryUserRepository::new(Arc::new(Journal::default())));
    registry.register_singleton("repo", Arc::clone(&repo))?;

    let first = registry.get_bean("repo").unwrap();
    for _ in 0..10 {
        assert!(registry.get_bean("repo").unwrap().ptr_eq(&first));
    }
    assert!(Arc::ptr_eq(
        &first.as_type::<MemoryUserRepository>().unwrap(),
        &repo
    ));
    Ok(())
}

#[test]
fn test_prototype_instances_are_distinct_and_wired() -> anyhow::Result<()> {
    let registry = registry();
    registry.register_interface::<dyn UserRepository, _>(
        "repo",
        Arc::new(MemoryUserRepository::new(Arc::new(Journal::default()))),
    )?;
    registry.register_prototype("handler", Arc::new(RequestHandler::default()))?;

    let first = registry.get_bean_as::<RequestHandler>("handler").unwrap();
    let second = registry.get_bean_as::<RequestHandler>("handler").unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    *first.hits.lock() += 1;
    assert_eq!(*second.hits.lock(), 0);

    let first_repo = first.repository.get().unwrap();
    assert_eq!(first_repo.find_user(1).as_deref(), Some("alice"));
    assert!(second.repository.is_wired());

    let record = registry.get_bean_definition("handler").unwrap();
    assert_eq!(record.scope, Scope::Prototype);
    assert!(record.instance.is_none());
    Ok(())
}

#[test]
fn test_type_resolution_round_trip() -> anyhow::Result<()> {
    let registry = registry();
    let journal = Arc::new(Journal::default());

    let concrete = Arc::new(MemoryUserRepository::new(journal.clone()));
    registry.register_singleton("concrete", Arc::clone(&concrete))?;
    let resolved = registry
        .get_bean_by_type(&TypeInfo::of::<MemoryUserRepository>())
        .unwrap();
    assert!(Arc::ptr_eq(
        &resolved.as_type::<MemoryUserRepository>().unwrap(),
        &concrete
    ));

    let bound = Arc::new(MemoryUserRepository::new(journal));
    registry.register_by_interface(
        &TypeInfo::of::<dyn UserRepository>(),
        registry.instance_of(Arc::clone(&bound)),
        "bound",
    )?;
    let by_interface = registry
        .get_bean_by_type(&TypeInfo::of::<dyn UserRepository>())
        .unwrap();
    assert!(by_interface.ptr_eq(&registry.get_bean("bound").unwrap()));
    assert_eq!(
        registry
            .get_bean_of::<dyn UserRepository>()
            .and_then(|repo| repo.find_user(2)),
        Some("bob".to_string())
    );
    Ok(())
}

#[test]
fn test_interface_binding_requires_declaration() {
    let registry = registry();

    let err = registry
        .register_interface::<dyn UserRepository, _>("report", Arc::new(ReportService::default()))
        .unwrap_err();

    assert!(matches!(err, RegistryError::TypeMismatch { .. }));
    assert!(registry.is_empty());
}

#[test]
fn test_beans_of_type_and_listing() -> anyhow::Result<()> {
    let registry = registry();
    let journal = Arc::new(Journal::default());
    registry.register_singleton("a", Arc::new(MemoryUserRepository::new(journal.clone())))?;
    registry.register_singleton("b", Arc::new(MemoryUserRepository::new(journal)))?;
    registry.register_singleton("report", Arc::new(ReportService::default()))?;

    let repos = registry.get_beans_of_type(&TypeInfo::of::<dyn UserRepository>());
    assert_eq!(repos.len(), 2);
    assert!(repos.contains_key("a") && repos.contains_key("b"));

    let mut names = registry.list_beans();
    names.sort();
    assert_eq!(names, vec!["a", "b", "report"]);
    assert_eq!(registry.registration_order(), vec!["a", "b", "report"]);
    Ok(())
}

#[test]
fn test_wire_all_by_interface() -> anyhow::Result<()> {
    let registry = registry();
    let report = Arc::new(ReportService::default());
    registry.register_singleton("report", Arc::clone(&report))?;
    registry.register_interface::<dyn UserRepository, _>(
        "repo",
        Arc::new(MemoryUserRepository::new(Arc::new(Journal::default()))),
    )?;

    registry.wire_all()?;

    assert_eq!(
        report.repository.get().and_then(|repo| repo.find_user(1)),
        Some("alice".to_string())
    );
    Ok(())
}
