use crate::observability::GLOBAL_LABELS;
use crate::prelude::*;
use crate::{config, Result};
use serde::Deserialize;
use serde_with::serde_as;
use std::collections::HashMap;
use std::ops::Deref;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub struct LoggingTask {
    loki: Option<LokiTask>,
}

struct LokiTask {
    task: tokio::task::JoinHandle<()>,
    controller: tracing_loki::BackgroundTaskController,
}

impl LoggingTask {
    pub async fn shutdown(self) {
        let Some(loki) = self.loki else {
            return;
        };

        info!("Waiting for the logging task to finish nicely...");

        let start = std::time::Instant::now();
        loki.controller.shutdown().await;
        let result = loki.task.await;

        eprintln!(
            "Stopped logging task in {:.2?}: {:?}",
            start.elapsed(),
            result
        );
    }
}

/// Installs the global `tracing` subscriber. Must be called from within
/// the tokio runtime, because the log shipping task is spawned here.
pub fn init_logging() -> Result<LoggingTask> {
    let vars: Vec<_> = std::env::vars().collect();
    let cfg: LoggingConfig = config::from_vars("", &vars)?;
    cfg.init_logging()
}

#[serde_as]
#[derive(Deserialize)]
struct LoggingConfig {
    /// Logs are duplicated to this file if it is set. The file is truncated
    /// at startup.
    log_file: Option<PathBuf>,

    loki_url: Option<url::Url>,

    #[serde_as(as = "serde_with::json::JsonString")]
    #[serde(default)]
    loki_labels: HashMap<String, String>,
}

impl LoggingConfig {
    fn init_logging(self) -> Result<LoggingTask> {
        let env_filter = EnvFilter::try_from_env("HOMEWORK_BOT_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(std::env::var("COLORS").as_deref() != Ok("0"))
            .with_writer(std::io::stderr)
            .pretty();

        let file = self
            .log_file
            .map(fs_err::File::create)
            .transpose()
            .fatal_ctx(|| "Failed to create the log file")?;

        let file = file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
        });

        let (loki, loki_task) = match self.loki_url {
            Some(url) => {
                let (layer, task) = init_loki(url, self.loki_labels)?;
                (Some(layer), Some(task))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(fmt)
            .with(file)
            .with(loki)
            .with(env_filter)
            .with(tracing_error::ErrorLayer::default())
            .init();

        init_panic_hook();

        Ok(LoggingTask { loki: loki_task })
    }
}

fn init_loki(
    url: url::Url,
    mut labels: HashMap<String, String>,
) -> Result<(tracing_loki::Layer, LokiTask)> {
    let additional_labels = GLOBAL_LABELS.iter().chain(&[("source", "homework-tg")]);

    labels.extend(additional_labels.map(|(k, v)| ((*k).to_owned(), (*v).to_owned())));

    let (layer, controller, task) = labels
        .into_iter()
        .try_fold(tracing_loki::builder(), |builder, (key, value)| {
            builder.label(key, value)
        })
        .and_then(|builder| builder.build_controller_url(url))
        .fatal_ctx(|| "Failed to set up the Loki logging layer")?;

    let task = tokio::spawn(task);

    Ok((layer, LokiTask { task, controller }))
}

fn init_panic_hook() {
    let current_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        // It's super-important to call the default panic hook, otherwise
        // we may not see it in the logs at all, because the panic may
        // happen inside of `tracing` logging system itself.
        current_hook(panic_info);

        let backtrace = std::backtrace::Backtrace::capture();
        let location = panic_info.location().map(|location| {
            format!(
                "{}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            )
        });

        // If the panic message was formatted using interpolated values,
        // it will be a `String`. Otherwise, it will be a `&str`.
        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<String>()
            .map(<_>::deref)
            .or_else(|| payload.downcast_ref::<&str>().map(<_>::deref))
            .unwrap_or("<unknown>");

        let span_trace = tracing_error::SpanTrace::capture();

        error!(
            target: "panic",
            thread = std::thread::current().name(),
            location,
            span_trace = %span_trace,
            backtrace = format_args!("\n{backtrace}"),
            "{message}"
        );
    }));
}
