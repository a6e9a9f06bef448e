use crate::prelude::*;
use crate::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use task_local_extensions::Extensions;

pub type Client = reqwest_middleware::ClientWithMiddleware;

const USER_AGENT: &str = concat!(
    "HomeworkTelegramBot/",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_CARGO_TARGET_TRIPLE"),
    ")",
);

/// There are no retries configured for the client. If the request fails,
/// the polling loop will just try again on its next iteration.
pub(crate) fn create_client(timeout: Duration) -> Result<Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .fatal_ctx(|| "Failed to build an HTTP client")?;

    Ok(reqwest_middleware::ClientBuilder::new(client)
        .with(ObservingMiddleware)
        .build())
}

struct ObservingMiddleware;

#[async_trait]
impl reqwest_middleware::Middleware for ObservingMiddleware {
    async fn handle(
        &self,
        request: reqwest::Request,
        extensions: &mut Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let span = info_span!(
            "request",
            version = ?request.version(),
            method = %request.method(),
            url = %request.url(),
        );

        async {
            let (result, duration) = measure_request(request, extensions, next).await;

            let duration = tracing_duration(duration);

            let response = match &result {
                Ok(response) => response,
                Err(err) => {
                    error!(duration, err = tracing_err(err), "Network request failed");
                    return result;
                }
            };

            let status = response.status();

            if status.is_success() {
                info!(duration, %status, "Network request succeeded");
            } else {
                warn!(duration, %status, "Network request failed (error status)");
            }

            result
        }
        .instrument(span)
        .await
    }
}

async fn measure_request(
    request: reqwest::Request,
    extensions: &mut Extensions,
    next: reqwest_middleware::Next<'_>,
) -> (reqwest_middleware::Result<reqwest::Response>, Duration) {
    let method = request.method().to_string();
    let host = request.url().host_str().unwrap_or("{unknown}").to_owned();

    let start = Instant::now();
    let result = next.run(request, extensions).await;
    let elapsed = start.elapsed();

    let status = match &result {
        Ok(response) => response.status().as_u16().to_string(),
        Err(_) => "{fatal}".to_owned(),
    };

    metrics::histogram!(
        crate::observability::metrics::HTTP_REQUEST_DURATION_SECONDS,
        elapsed,
        "method" => method,
        "host" => host,
        "status" => status
    );

    (result, elapsed)
}
