//! 并发集成测试：多线程注册与解析

use ioc_common::{
    Component, ComponentDescriptor, Destroyer, HookResult, Initializer, NopSink, RegistryError,
};
use ioc_container::{ApplicationContext, Registry};
use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use support::{Journal, MemoryUserRepository, RequestHandler, Step, UserRepository};

/// 初始化时通知外部线程并短暂停留的组件
struct Gate {
    entered: Mutex<Option<mpsc::Sender<()>>>,
    journal: Arc<Journal>,
}

impl Gate {
    fn new(entered: mpsc::Sender<()>, journal: Arc<Journal>) -> Self {
        Self {
            entered: Mutex::new(Some(entered)),
            journal,
        }
    }
}

impl Initializer for Gate {
    fn init(&self) -> HookResult {
        self.journal.record("gate.init");
        if let Some(entered) = self.entered.lock().take() {
            let _ = entered.send(());
        }
        thread::sleep(Duration::from_millis(50));
        Ok(())
    }
}

impl Destroyer for Gate {
    fn destroy(&self) -> HookResult {
        self.journal.record("gate.destroy");
        Ok(())
    }
}

impl Component for Gate {
    fn describe() -> ComponentDescriptor {
        ComponentDescriptor::builder::<Self>()
            .name("gate")
            .initializer()
            .destroyer()
            .build()
    }
}

#[test]
fn test_concurrent_registration_and_lookup() {
    let registry = Arc::new(Registry::with_sink(Arc::new(NopSink)));
    let journal = Arc::new(Journal::default());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            let journal = Arc::clone(&journal);
            thread::spawn(move || {
                for i in 0..25 {
                    let name = format!("repo-{worker}-{i}");
                    registry
                        .register_singleton(
                            name.clone(),
                            Arc::new(MemoryUserRepository::new(journal.clone())),
                        )
                        .unwrap();
                    assert!(registry.get_bean(&name).is_some());
                    let _ = registry.get_bean_of::<MemoryUserRepository>();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), 200);
    assert_eq!(registry.registration_order().len(), 200);
}

#[test]
fn test_concurrent_duplicate_registration_has_one_winner() {
    let registry = Arc::new(Registry::with_sink(Arc::new(NopSink)));
    let journal = Arc::new(Journal::default());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let journal = Arc::clone(&journal);
            thread::spawn(move || {
                registry.register_singleton("shared", Arc::new(MemoryUserRepository::new(journal)))
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(RegistryError::DuplicateName { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(duplicates, 7);
}

#[test]
fn test_concurrent_prototype_resolution() -> anyhow::Result<()> {
    let ctx = Arc::new(
        ApplicationContext::builder()
            .with_sink(Arc::new(NopSink))
            .build(),
    );
    ctx.register_interface::<dyn UserRepository, _>(
        "repo",
        Arc::new(MemoryUserRepository::new(Arc::new(Journal::default()))),
    )?;
    ctx.register_prototype("handler", Arc::new(RequestHandler::default()))?;
    ctx.start()?;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                (0..50)
                    .map(|_| {
                        let handler = ctx.get_bean_as::<RequestHandler>("handler").unwrap();
                        assert!(handler.repository.is_wired());
                        handler
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut handlers = Vec::new();
    for handle in handles {
        handlers.extend(handle.join().unwrap());
    }

    assert_eq!(handlers.len(), 400);
    for (i, handler) in handlers.iter().enumerate().skip(1) {
        assert!(!Arc::ptr_eq(handler, &handlers[i - 1]));
    }

    ctx.stop()?;
    Ok(())
}

#[test]
fn test_registration_during_start_is_initialized() -> anyhow::Result<()> {
    let ctx = Arc::new(
        ApplicationContext::builder()
            .with_sink(Arc::new(NopSink))
            .build(),
    );
    let journal = Arc::new(Journal::default());
    let (entered, gate_entered) = mpsc::channel();
    ctx.register_singleton("gate", Arc::new(Gate::new(entered, journal.clone())))?;

    let registrar = {
        let ctx = Arc::clone(&ctx);
        let journal = journal.clone();
        thread::spawn(move || {
            gate_entered.recv().unwrap();
            ctx.register_singleton("late", Arc::new(Step::new(journal)))
        })
    };

    ctx.start()?;
    registrar.join().unwrap()?;

    assert_eq!(ctx.init_order(), vec!["gate", "late"]);
    assert!(journal.entries().contains(&"late.init".to_string()));

    ctx.stop()?;
    assert_eq!(ctx.destroy_order(), vec!["late", "gate"]);
    assert_eq!(
        journal.entries(),
        vec![
            "gate.init",
            "late.init",
            "late.pre_destroy",
            "late.destroy",
            "gate.destroy",
        ]
    );
    Ok(())
}

#[test]
fn test_concurrent_refresh_never_observes_started_context() -> anyhow::Result<()> {
    let ctx = Arc::new(
        ApplicationContext::builder()
            .with_sink(Arc::new(NopSink))
            .build(),
    );
    ctx.start()?;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || (0..20).map(|_| ctx.refresh()).collect::<Vec<_>>())
        })
        .collect();

    for handle in handles {
        for result in handle.join().unwrap() {
            result?;
        }
    }

    assert!(ctx.is_started());
    ctx.stop()?;
    Ok(())
}
