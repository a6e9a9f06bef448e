use super::{HomeworkStatus, PracticumError};
use crate::error::err;
use crate::prelude::*;
use crate::Result;
use serde_json::Value;

/// Verifies the response has the shape `{ "homeworks": [...] }` and returns
/// the homeworks. The newest homework comes first. An empty list means there
/// were no status changes.
pub(crate) fn check_response(response: &Value) -> Result<&[Value]> {
    let Some(response) = response.as_object() else {
        return Err(err!(PracticumError::TypeMismatch { what: "response" }));
    };

    let Some(homeworks) = response.get("homeworks").and_then(Value::as_array) else {
        return Err(err!(PracticumError::TypeMismatch { what: "homeworks" }));
    };

    Ok(homeworks)
}

/// Server time of the response, which is the lower bound for the next query
pub(crate) fn current_date(response: &Value) -> Option<i64> {
    response.get("current_date")?.as_i64()
}

/// Renders the notification about the status of the given homework record.
pub(crate) fn parse_status(homework: &Value) -> Result<String> {
    let field = |key: &str| homework.get(key).filter(|value| !value.is_null());

    let status = field("status")
        .ok_or_else(|| err!(PracticumError::EmptyValue { key: "homework_status" }))?;

    let name = field("homework_name")
        .ok_or_else(|| err!(PracticumError::EmptyValue { key: "homework_name" }))?;

    let status = match status.as_str().map(str::parse::<HomeworkStatus>) {
        Some(Ok(status)) => status,
        _ => {
            let status = status
                .as_str()
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| status.to_string());

            return Err(err!(PracticumError::UnknownStatus { status }));
        }
    };

    let name = name
        .as_str()
        .ok_or_else(|| err!(PracticumError::TypeMismatch { what: "homework_name" }))?;

    debug!(name, status = <&'static str>::from(status), "Parsed homework status");

    Ok(format!(
        "Изменился статус проверки работы \"{name}\". {}",
        status.verdict()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use assert_matches::assert_matches;
    use expect_test::{expect, Expect};
    use serde_json::json;
    use strum::IntoEnumIterator;

    /// Unwraps the error of the `result` and returns its kind
    macro_rules! err_kind {
        ($result:expr) => {
            $result.unwrap_err().kind()
        };
    }

    #[track_caller]
    fn assert_parse_status(homework: Value, expected: Expect) {
        let actual = match parse_status(&homework) {
            Ok(message) => message,
            Err(err) => format!("Err: {err}"),
        };
        expected.assert_eq(&actual);
    }

    #[test]
    fn check_response_rejects_non_object() {
        for response in [json!([]), json!(null), json!("homeworks"), json!(42)] {
            assert_matches!(
                err_kind!(check_response(&response)),
                ErrorKind::Practicum {
                    source: PracticumError::TypeMismatch { what: "response" }
                }
            );
        }
    }

    #[test]
    fn check_response_rejects_missing_or_malformed_homeworks() {
        let responses = [
            json!({}),
            json!({ "current_date": 1000 }),
            json!({ "homeworks": null, "current_date": 1000 }),
            json!({ "homeworks": {}, "current_date": 1000 }),
            json!({ "homeworks": "hw1" }),
        ];
        for response in responses {
            assert_matches!(
                err_kind!(check_response(&response)),
                ErrorKind::Practicum {
                    source: PracticumError::TypeMismatch { what: "homeworks" }
                }
            );
        }
    }

    #[test]
    fn check_response_returns_homeworks_as_is() {
        let response = json!({ "homeworks": [], "current_date": 1000 });
        assert!(check_response(&response).unwrap().is_empty());

        let response = json!({
            "homeworks": [
                { "homework_name": "hw2", "status": "reviewing" },
                { "homework_name": "hw1", "status": "approved" },
            ],
            "current_date": 1000,
        });
        let homeworks = check_response(&response).unwrap();
        assert_eq!(homeworks.len(), 2);
        assert_eq!(homeworks[0]["homework_name"], "hw2");
    }

    #[test]
    fn current_date_requires_an_integer() {
        assert_eq!(current_date(&json!({ "current_date": 1000 })), Some(1000));
        assert_eq!(current_date(&json!({ "current_date": "1000" })), None);
        assert_eq!(current_date(&json!({ "homeworks": [] })), None);
        assert_eq!(current_date(&json!([])), None);
    }

    #[test]
    fn parse_status_renders_every_known_status() {
        for status in HomeworkStatus::iter() {
            let code: &'static str = status.into();
            let message = parse_status(&json!({ "homework_name": "hw1", "status": code })).unwrap();

            assert!(message.contains("\"hw1\""), "{message}");
            assert!(message.ends_with(status.verdict()), "{message}");
        }
    }

    #[test]
    fn parse_status_smoke() {
        assert_parse_status(
            json!({ "homework_name": "hw1", "status": "approved" }),
            expect![[r#"Изменился статус проверки работы "hw1". Работа проверена: ревьюеру всё понравилось. Ура!"#]],
        );
        assert_parse_status(
            json!({ "homework_name": "user__hw_python_oop.zip", "status": "reviewing", "id": 1 }),
            expect![[r#"Изменился статус проверки работы "user__hw_python_oop.zip". Работа взята на проверку ревьюером."#]],
        );
        assert_parse_status(
            json!({ "homework_name": "hw1", "status": "rejected" }),
            expect![[r#"Изменился статус проверки работы "hw1". Работа проверена: у ревьюера есть замечания."#]],
        );
    }

    #[test]
    fn parse_status_errors() {
        assert_parse_status(
            json!({ "homework_name": "hw1" }),
            expect!["Err: homework_status имеет пустое значение"],
        );
        assert_parse_status(
            json!({ "homework_name": "hw1", "status": null }),
            expect!["Err: homework_status имеет пустое значение"],
        );
        assert_parse_status(
            json!({ "status": "approved" }),
            expect!["Err: homework_name имеет пустое значение"],
        );
        assert_parse_status(
            json!({ "homework_name": "hw1", "status": "on_hold" }),
            expect!["Err: Получен недокументированный статус домашней работы: on_hold"],
        );
        assert_parse_status(
            json!({ "homework_name": "hw1", "status": 3 }),
            expect!["Err: Получен недокументированный статус домашней работы: 3"],
        );
        assert_parse_status(
            json!({ "homework_name": ["hw1"], "status": "approved" }),
            expect!["Err: Неожиданный тип значения homework_name в ответе API"],
        );
    }

    #[test]
    fn missing_status_is_checked_before_missing_name() {
        assert_matches!(
            err_kind!(parse_status(&json!({}))),
            ErrorKind::Practicum {
                source: PracticumError::EmptyValue { key: "homework_status" }
            }
        );
    }

    #[test]
    fn unknown_status_is_checked_after_missing_name() {
        assert_matches!(
            err_kind!(parse_status(&json!({ "status": "on_hold" }))),
            ErrorKind::Practicum {
                source: PracticumError::EmptyValue { key: "homework_name" }
            }
        );
        assert_matches!(
            err_kind!(parse_status(&json!({ "homework_name": "hw1", "status": "on_hold" }))),
            ErrorKind::Practicum {
                source: PracticumError::UnknownStatus { status }
            } if status == "on_hold"
        );
    }
}
