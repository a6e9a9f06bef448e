//! Vocabulary of the homework statuses API and the errors of talking to it.
use reqwest::StatusCode;

/// Closed set of the review statuses the API is documented to return.
/// Any other status is reported as an error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub(crate) fn verdict(self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

/// Errors of a single polling iteration. Their display text is what gets
/// sent to the chat, so it is kept human-readable.
#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum PracticumError {
    #[error("Сбой запроса к эндпоинту {endpoint}")]
    Request {
        endpoint: url::Url,
        source: reqwest_middleware::Error,
    },

    #[error("Эндпоинт {endpoint} недоступен. Код ответа API: {code}", code = .status.as_u16())]
    NonOkStatus {
        endpoint: url::Url,
        status: StatusCode,
    },

    #[error("Ответ API не является корректным JSON")]
    Decode { source: serde_json::Error },

    #[error("Неожиданный тип значения {what} в ответе API")]
    TypeMismatch { what: &'static str },

    #[error("{key} имеет пустое значение")]
    EmptyValue { key: &'static str },

    #[error("Получен недокументированный статус домашней работы: {status}")]
    UnknownStatus { status: String },
}
