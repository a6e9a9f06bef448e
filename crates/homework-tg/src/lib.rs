mod config;
mod error;
mod http;
mod observability;
mod poller;
mod practicum;
mod tg;
mod util;

pub use crate::error::{Error, Result};
pub use config::*;
pub use observability::{init_logging, init_metrics, tracing_err, LoggingTask};

#[allow(unused_imports)]
mod prelude {
    pub(crate) use crate::error::prelude::*;
    pub(crate) use crate::observability::logging::prelude::*;
    pub(crate) use crate::util::prelude::*;
}

/// Run the homework status polling loop. It never returns unless it fails
/// to start.
pub async fn run(config: Config) -> Result {
    let http = http::create_client(config.practicum.timeout)?;

    let api = practicum::Client::new(&config.practicum, http);
    let notifier = tg::TgNotifier::new(config.tg);

    let cursor = chrono::Utc::now().timestamp();

    poller::Poller::new(api, notifier, config.practicum.retry_time, cursor)
        .run()
        .await;

    Ok(())
}
