//! Basic example of the Rabt binder.

use std::sync::Arc;

use rabt::prelude::*;
use rabt::{implements, injectable};

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

implements!(ConsoleLogger => dyn Logger);

struct Database {
    url: Arc<String>,
    logger: Arc<dyn Logger>,
    connected: bool,
}

#[injectable]
impl Database {
    pub fn new(#[named("database_url")] url: Arc<String>, logger: Arc<dyn Logger>) -> Self {
        Database {
            url,
            logger,
            connected: false,
        }
    }

    #[post_construct]
    pub fn connect(&mut self) {
        self.logger.log(&format!("Connecting to {}", self.url));
        self.connected = true;
    }

    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {} (connected: {})", self.url, self.connected)
    }
}

struct UserService {
    db: Arc<Database>,
    page_size: u32,
}

#[injectable]
impl UserService {
    pub fn new(db: Arc<Database>) -> Self {
        UserService { db, page_size: 10 }
    }

    #[inject(name = "page_size")]
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size;
    }

    fn get_user(&self, id: u64) -> String {
        self.db
            .query(&format!("SELECT * FROM users WHERE id = {id} LIMIT {}", self.page_size))
    }
}

// === Group infrastructure bindings in a module ===

struct Infrastructure;

impl BindingModule for Infrastructure {
    fn configure(&self, binder: &InjectionBinder) -> rabt::Result<()> {
        binder
            .bind::<String>()
            .named("database_url")
            .as_value(String::from("postgres://localhost/myapp"))?;
        binder.bind::<dyn Logger>().to_factory(|_| Ok(ConsoleLogger))?;
        binder.bind::<Database>().to_singleton::<Database>()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "infrastructure"
    }
}

fn main() -> rabt::Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("rabt_container=debug")
        .init();

    let binder = InjectionBinder::new();
    binder.install(&Infrastructure)?;
    binder.bind::<u32>().named("page_size").as_value(25u32)?;
    binder.bind::<UserService>().to::<UserService>()?;

    // Check the whole graph before building anything
    binder.validate()?;
    println!("Binder validated: {binder:?}");

    let service: Arc<UserService> = binder.get_instance()?;
    println!("{}", service.get_user(42));

    // The database is a singleton, so a second service shares it
    let other: Arc<UserService> = binder.get_instance()?;
    println!("Shared database: {}", Arc::ptr_eq(&service.db, &other.db));

    // Unbinding a dependency breaks resolution with a diagnostic
    binder.unbind::<u32>(Some(&Qualifier::from("page_size")));
    if let Err(e) = binder.get_instance::<UserService>() {
        println!("{e}");
    }

    Ok(())
}
