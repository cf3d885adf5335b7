use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use anyhow::Context;
use tether_config::{Config, ConfigProvider};
use tether_di::{factory_fn, implements, Container, Lifetime, Registration};
use tracing_subscriber::EnvFilter;

/// Name of the environment variable selecting the repository lifetime
const LIFETIME_VAR: &str = "TETHER_REPOSITORY_LIFETIME";

#[derive(Debug, Clone)]
struct DemoConfig {
    repository_lifetime: Lifetime,
    greeting: String,
}

impl DemoConfig {
    fn from_env() -> anyhow::Result<Self> {
        let repository_lifetime = match std::env::var(LIFETIME_VAR) {
            Ok(value) => value
                .parse()
                .with_context(|| format!("{LIFETIME_VAR} has an invalid value"))?,
            Err(_) => Lifetime::Scoped,
        };

        Ok(DemoConfig {
            repository_lifetime,
            greeting: "Hello".to_string(),
        })
    }
}

trait Repository: Send + Sync {
    fn next_id(&self) -> u32;
}

#[derive(Default)]
struct MemoryRepository {
    last_id: AtomicU32,
}

impl Repository for MemoryRepository {
    fn next_id(&self) -> u32 {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}
implements!(MemoryRepository: dyn Repository);

trait Service: Send + Sync {
    fn create_message(&self, name: &str) -> String;
}

struct GreetingService {
    repository: Arc<dyn Repository>,
    greeting: String,
}

impl Service for GreetingService {
    fn create_message(&self, name: &str) -> String {
        format!(
            "{}, {name}! (message #{})",
            self.greeting,
            self.repository.next_id()
        )
    }
}
implements!(GreetingService: dyn Service);

fn greeting_service(
    repository: Arc<dyn Repository>,
    config: Config<DemoConfig>,
) -> GreetingService {
    GreetingService {
        repository,
        greeting: config.greeting.clone(),
    }
}

fn handle_request(repository: Arc<dyn Repository>, service: Arc<dyn Service>) -> String {
    let message = service.create_message("tether");
    format!("{message}, next id {}", repository.next_id())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DemoConfig::from_env()?;
    tracing::info!("Repository lifetime is {}", config.repository_lifetime);

    let container = Container::new();

    Registration::new(
        config.repository_lifetime,
        factory_fn(MemoryRepository::default),
    )
    .as_interface::<dyn Repository>()
    .register(&container)?;
    Registration::scoped(factory_fn(greeting_service))
        .as_interface::<dyn Service>()
        .register(&container)?;

    let mut configs = ConfigProvider::new();
    configs.add_config(config)?;
    configs.register(&container)?;

    if let Err(errors) = container.graph()?.check() {
        anyhow::bail!("{errors}");
    }
    println!("{}", container.graph()?);

    let handler = container.inject(handle_request);
    for request in 1..=3 {
        let response = handler.call()?;
        tracing::info!("Request {request}: {response}");
    }

    Ok(())
}
