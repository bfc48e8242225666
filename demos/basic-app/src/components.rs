//! 示例组件：仓储、缓存、用户服务与控制器

use ioc_common::{
    Autowired, Component, ComponentDescriptor, Destroyer, HookResult, Initializer, PostConstruct,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::info;

/// 用户模型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
}

pub trait UserRepository: Send + Sync {
    fn find_by_id(&self, id: u32) -> Option<User>;
    fn save(&self, user: User);
}

pub trait CacheService: Send + Sync {
    fn get(&self, key: &str) -> Option<User>;
    fn set(&self, key: &str, user: User);
}

pub trait UserService: Send + Sync {
    fn get_user(&self, id: u32) -> Option<User>;
    fn create_user(&self, name: &str, email: &str) -> User;
}

/// 内存用户仓储
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<u32, User>>,
}

impl UserRepository for MemoryUserRepository {
    fn find_by_id(&self, id: u32) -> Option<User> {
        self.users.read().get(&id).cloned()
    }

    fn save(&self, user: User) {
        info!("保存用户: {:?}", user);
        self.users.write().insert(user.id, user);
    }
}

impl Initializer for MemoryUserRepository {
    fn init(&self) -> HookResult {
        let mut users = self.users.write();
        for (id, name, email) in [
            (1, "张三", "zhangsan@example.com"),
            (2, "李四", "lisi@example.com"),
        ] {
            users.insert(
                id,
                User {
                    id,
                    name: name.to_string(),
                    email: email.to_string(),
                },
            );
        }
        info!("UserRepository 初始化完成, 加载 {} 条测试数据", users.len());
        Ok(())
    }
}

impl Component for MemoryUserRepository {
    fn describe() -> ComponentDescriptor {
        ComponentDescriptor::builder::<Self>()
            .name("userRepository")
            .implements::<dyn UserRepository>(|repo| repo)
            .initializer()
            .build()
    }
}

/// 内存缓存
#[derive(Default)]
pub struct MapCache {
    entries: RwLock<HashMap<String, User>>,
}

impl CacheService for MapCache {
    fn get(&self, key: &str) -> Option<User> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, user: User) {
        self.entries.write().insert(key.to_string(), user);
    }
}

impl Initializer for MapCache {
    fn init(&self) -> HookResult {
        info!("CacheService 初始化完成");
        Ok(())
    }
}

impl Destroyer for MapCache {
    fn destroy(&self) -> HookResult {
        let evicted = {
            let mut entries = self.entries.write();
            let count = entries.len();
            entries.clear();
            count
        };
        info!("CacheService 销毁完成, 清理 {} 条缓存", evicted);
        Ok(())
    }
}

impl Component for MapCache {
    fn describe() -> ComponentDescriptor {
        ComponentDescriptor::builder::<Self>()
            .name("cacheService")
            .implements::<dyn CacheService>(|cache| cache)
            .initializer()
            .destroyer()
            .build()
    }
}

/// 用户服务
#[derive(Default)]
pub struct UserServiceImpl {
    repository: Autowired<dyn UserRepository>,
    cache: Autowired<dyn CacheService>,
    next_id: AtomicU32,
}

impl UserServiceImpl {
    fn repository(&self) -> Option<Arc<dyn UserRepository>> {
        self.repository.get()
    }
}

impl UserService for UserServiceImpl {
    fn get_user(&self, id: u32) -> Option<User> {
        let key = format!("user:{id}");
        if let Some(user) = self.cache.get().and_then(|cache| cache.get(&key)) {
            info!("从缓存获取用户: {:?}", user);
            return Some(user);
        }

        let user = self.repository()?.find_by_id(id)?;
        if let Some(cache) = self.cache.get() {
            cache.set(&key, user.clone());
        }
        info!("从仓储获取用户: {:?}", user);
        Some(user)
    }

    fn create_user(&self, name: &str, email: &str) -> User {
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            email: email.to_string(),
        };
        if let Some(repository) = self.repository() {
            repository.save(user.clone());
        }
        if let Some(cache) = self.cache.get() {
            cache.set(&format!("user:{}", user.id), user.clone());
        }
        user
    }
}

impl Initializer for UserServiceImpl {
    fn init(&self) -> HookResult {
        self.next_id.store(100, Ordering::SeqCst);
        info!("UserService 初始化完成");
        Ok(())
    }
}

impl PostConstruct for UserServiceImpl {
    fn post_construct(&self) -> HookResult {
        info!("UserService 构造后处理完成");
        Ok(())
    }
}

impl Component for UserServiceImpl {
    fn describe() -> ComponentDescriptor {
        ComponentDescriptor::builder::<Self>()
            .name("userService")
            .implements::<dyn UserService>(|svc| svc)
            .inject_by_name("repository", "userRepository", |svc| &svc.repository)
            .inject_by_name("cache", "cacheService", |svc| &svc.cache)
            .initializer()
            .post_construct()
            .build()
    }
}

/// 请求级控制器，每次解析创建新实例
#[derive(Default)]
pub struct UserController {
    service: Autowired<dyn UserService>,
}

impl UserController {
    pub fn show(&self, id: u32) -> String {
        match self.service.get().and_then(|svc| svc.get_user(id)) {
            Some(user) => format!("#{} {} <{}>", user.id, user.name, user.email),
            None => format!("#{id} 不存在"),
        }
    }

    pub fn register(&self, name: &str, email: &str) -> Option<User> {
        self.service.get().map(|svc| svc.create_user(name, email))
    }
}

impl Component for UserController {
    fn describe() -> ComponentDescriptor {
        ComponentDescriptor::builder::<Self>()
            .name("userController")
            .inject_by_type("service", |c| &c.service)
            .prototype()
            .build()
    }
}
