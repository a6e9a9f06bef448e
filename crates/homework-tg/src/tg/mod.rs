//! Delivery of the notifications to Telegram

mod config;

use crate::observability::metrics::HOMEWORK_NOTIFICATIONS_TOTAL;
use crate::prelude::*;
use async_trait::async_trait;
use teloxide::prelude::*;

pub(crate) use config::*;

/// Result of a best-effort message delivery. Delivery failures are never
/// propagated as errors, the caller may only log them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum DeliveryOutcome {
    Delivered,
    Failed,
}

/// What the message is about. Used only for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum MessageKind {
    Status,
    Error,
}

#[async_trait]
pub(crate) trait Notifier: Send + Sync {
    async fn notify(&self, kind: MessageKind, text: &str) -> DeliveryOutcome;
}

pub(crate) struct TgNotifier {
    bot: teloxide::Bot,
    chat: ChatDestination,
}

impl TgNotifier {
    pub(crate) fn new(cfg: Config) -> Self {
        Self {
            bot: teloxide::Bot::new(cfg.token),
            chat: cfg.chat,
        }
    }

    #[cfg(test)]
    fn with_api_url(mut self, url: url::Url) -> Self {
        self.bot = self.bot.set_api_url(url);
        self
    }
}

#[async_trait]
impl Notifier for TgNotifier {
    async fn notify(&self, kind: MessageKind, text: &str) -> DeliveryOutcome {
        let result = self.bot.send_message(self.chat.clone(), text).await;

        let outcome = match result {
            Ok(_) => {
                info!(chat = %self.chat, text, "Message sent to Telegram");
                DeliveryOutcome::Delivered
            }
            Err(err) => {
                warn!(
                    err = tracing_err(&err),
                    chat = %self.chat,
                    text,
                    "Failed to send message to Telegram"
                );
                DeliveryOutcome::Failed
            }
        };

        metrics::increment_counter!(
            HOMEWORK_NOTIFICATIONS_TOTAL,
            "kind" => <&'static str>::from(kind),
            "result" => <&'static str>::from(outcome)
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use teloxide::types::ChatId;

    #[test_log::test(tokio::test)]
    async fn delivery_failure_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                Matcher::Regex(r"(?i)^/botsecret/sendmessage$".to_owned()),
            )
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
            )
            .expect(2)
            .create_async()
            .await;

        let notifier = TgNotifier::new(Config {
            token: "secret".to_owned(),
            chat: ChatDestination::Id(ChatId(42)),
        })
        .with_api_url(server.url().parse().unwrap());

        // Sending the same text twice is harmless
        for _ in 0..2 {
            let outcome = notifier.notify(MessageKind::Error, "Ошибка: boom").await;
            assert_eq!(outcome, DeliveryOutcome::Failed);
        }

        mock.assert_async().await;
    }

    #[test_log::test(tokio::test)]
    async fn unreachable_api_is_swallowed() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let notifier = TgNotifier::new(Config {
            token: "secret".to_owned(),
            chat: ChatDestination::Channel("@homework".to_owned()),
        })
        .with_api_url(format!("http://127.0.0.1:{port}").parse().unwrap());

        let outcome = notifier.notify(MessageKind::Status, "hello").await;
        assert_eq!(outcome, DeliveryOutcome::Failed);
    }
}
