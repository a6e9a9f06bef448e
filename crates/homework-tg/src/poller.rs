//! The main loop of the bot. It periodically requests the homework statuses
//! and forwards the changes and the errors to the chat.

use crate::error::ErrorKind;
use crate::observability::metrics::HOMEWORK_POLLS_TOTAL;
use crate::practicum::{self, HomeworkApi};
use crate::prelude::*;
use crate::tg::{MessageKind, Notifier};
use crate::Result;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum PollOutcome {
    /// The newest homework status was sent to the chat
    StatusChanged,

    /// There were no homework status changes since the last poll
    NoChange,

    /// The iteration failed, and the error was sent to the chat
    ErrorReported,

    /// The iteration failed with the same error as the one previously
    /// reported, so it wasn't sent to the chat again
    ErrorSuppressed,
}

pub(crate) struct Poller<A, N> {
    api: A,
    notifier: N,
    retry_time: Duration,

    /// Unix timestamp, the lower bound of the statuses to request
    cursor: i64,

    /// Text of the last error sent to the chat. Empty if there is none.
    last_error: String,
}

impl<A: HomeworkApi, N: Notifier> Poller<A, N> {
    pub(crate) fn new(api: A, notifier: N, retry_time: Duration, cursor: i64) -> Self {
        Self {
            api,
            notifier,
            retry_time,
            cursor,
            last_error: String::new(),
        }
    }

    /// Runs the polling iterations forever. There is no way to stop the loop
    /// other than to drop the future.
    pub(crate) async fn run(mut self) {
        info!(
            cursor = self.cursor,
            retry_time = tracing_duration(self.retry_time),
            "Starting the polling loop"
        );

        loop {
            self.tick().await;

            debug!(
                retry_time = tracing_duration(self.retry_time),
                "Waiting before the next poll"
            );

            tokio::time::sleep(self.retry_time).await;
        }
    }

    /// Single iteration of the polling loop. Never fails: all errors are
    /// logged and reported to the chat.
    pub(crate) async fn tick(&mut self) -> PollOutcome {
        let span = info_span!("poll", cursor = self.cursor);

        async {
            let (outcome, error_kind) = match self.poll().await {
                Ok(outcome) => {
                    self.last_error.clear();
                    (outcome, "none")
                }
                Err(err) => {
                    let error_kind = error_kind(&err);
                    (self.report_error(err, error_kind).await, error_kind)
                }
            };

            let outcome_label: &'static str = outcome.into();
            metrics::increment_counter!(
                HOMEWORK_POLLS_TOTAL,
                "outcome" => outcome_label,
                "error_kind" => error_kind
            );

            outcome
        }
        .instrument(span)
        .await
    }

    async fn poll(&mut self) -> Result<PollOutcome> {
        let response = self.api.get_homework_statuses(Some(self.cursor)).await?;

        // The cursor moves even if the response turns out to be malformed
        // later, because the server has already seen this time window.
        match practicum::current_date(&response) {
            Some(current_date) => self.cursor = current_date,
            None => warn!(
                cursor = self.cursor,
                "Response has no integer current_date, keeping the cursor"
            ),
        }

        let homeworks = practicum::check_response(&response)?;

        let Some(homework) = homeworks.first() else {
            info!("Homework status hasn't changed");
            return Ok(PollOutcome::NoChange);
        };

        let message = practicum::parse_status(homework)?;

        self.notifier.notify(MessageKind::Status, &message).await;

        info!("Homework review status has changed");

        Ok(PollOutcome::StatusChanged)
    }

    async fn report_error(&mut self, err: crate::Error, error_kind: &'static str) -> PollOutcome {
        let message = err.to_chat_message();

        error!(err = tracing_err(&err), error_kind, "Polling iteration failed");

        if message == self.last_error {
            debug!("The error was already reported, not sending it again");
            return PollOutcome::ErrorSuppressed;
        }

        self.notifier.notify(MessageKind::Error, &message).await;
        self.last_error = message;

        PollOutcome::ErrorReported
    }
}

/// Low-cardinality label of the error for logs and metrics
fn error_kind(err: &crate::Error) -> &'static str {
    match err.kind() {
        ErrorKind::Practicum { source } => source.into(),
        ErrorKind::Config { .. } => "config",
        ErrorKind::Fatal { .. } => "fatal",
    }
}
