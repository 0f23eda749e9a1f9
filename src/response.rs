//! Wire shapes and envelope checks for the calendars service. The vendor
//! reports errors inside a successful HTTP response, as a `Messages` list
//! under the `d` wrapper; absence of `Messages` means the call succeeded.

use serde::Deserialize;

use crate::client::HttpResponse;
use crate::error::{Result, TrumbaError};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CalendarListResponse {
    pub d: Option<CalendarListData>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CalendarListData {
    #[serde(rename = "Calendars", default)]
    pub calendars: Option<Vec<RawCalendar>>,
    #[serde(rename = "Messages", default)]
    pub messages: Option<Vec<RawMessage>>,
}

/// One nested calendar record as the vendor returns it. Fields are kept
/// optional so a malformed record can be dropped instead of failing the
/// whole response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCalendar {
    #[serde(rename = "ID", default)]
    pub id: Option<i64>,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "ChildCalendars", default)]
    pub child_calendars: Option<Vec<RawCalendar>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PermissionsResponse {
    pub d: Option<PermissionsData>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PermissionsData {
    #[serde(rename = "Users", default)]
    pub users: Option<Vec<RawUser>>,
    #[serde(rename = "Messages", default)]
    pub messages: Option<Vec<RawMessage>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawUser {
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Level", default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMessage {
    #[serde(rename = "Code", default)]
    pub code: Option<serde_json::Value>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

impl RawMessage {
    /// The vendor emits codes as numbers or numeric strings.
    pub fn code_value(&self) -> Option<i64> {
        match &self.code {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Status takes precedence over the body: a non-2xx response is a data
/// failure no matter what the body says, and a 2xx response without a body
/// carries no data to inspect.
pub(crate) fn ensure_body<'a>(request_id: &str, response: &'a HttpResponse) -> Result<&'a str> {
    if !response.is_success() {
        return Err(TrumbaError::DataFailure {
            request: request_id.to_string(),
            status: response.status,
            reason: response.reason.clone(),
        });
    }
    if response.body.trim().is_empty() {
        return Err(TrumbaError::NoDataReturned {
            request: request_id.to_string(),
        });
    }
    Ok(&response.body)
}

pub(crate) fn check_messages(
    request_id: &str,
    messages: &Option<Vec<RawMessage>>,
) -> Result<()> {
    let messages = match messages {
        Some(messages) => messages,
        None => return Ok(()),
    };

    let code = match messages.first().and_then(RawMessage::code_value) {
        Some(code) => code,
        None => {
            return Err(TrumbaError::UnknownResponse {
                request: request_id.to_string(),
            });
        }
    };

    match code {
        3006 => Err(TrumbaError::CalendarNotFound),
        3007 => Err(TrumbaError::CalendarOwnedByDiffAccount),
        _ => {
            let description = messages
                .first()
                .and_then(|m| m.description.as_deref())
                .unwrap_or("");
            tracing::warn!(
                "Unexpected error code {} {} for {}",
                code,
                description,
                request_id
            );
            Err(TrumbaError::UnexpectedCode {
                request: request_id.to_string(),
                code,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            reason: "reason".to_string(),
            body: body.to_string(),
        }
    }

    fn message(code: serde_json::Value) -> RawMessage {
        RawMessage {
            code: Some(code),
            description: None,
        }
    }

    #[test]
    fn non_2xx_status_is_a_data_failure_regardless_of_body() {
        let resp = response(543, r#"{"d": {}}"#);
        let result = ensure_body("req", &resp);
        assert!(matches!(
            result,
            Err(TrumbaError::DataFailure { status: 543, .. })
        ));
    }

    #[test]
    fn empty_body_on_success_is_no_data_returned() {
        let resp = response(200, "  ");
        let result = ensure_body("req", &resp);
        assert!(matches!(result, Err(TrumbaError::NoDataReturned { .. })));
    }

    #[test]
    fn successful_response_yields_the_body() {
        let resp = response(200, r#"{"d": {}}"#);
        let body = ensure_body("req", &resp).unwrap();
        assert_eq!(body, r#"{"d": {}}"#);
    }

    #[test]
    fn absent_messages_means_success() {
        assert!(check_messages("req", &None).is_ok());
    }

    #[test]
    fn empty_messages_list_is_an_unknown_response() {
        let result = check_messages("req", &Some(vec![]));
        assert!(matches!(result, Err(TrumbaError::UnknownResponse { .. })));
    }

    #[test]
    fn message_without_a_code_is_an_unknown_response() {
        let result = check_messages(
            "req",
            &Some(vec![RawMessage {
                code: None,
                description: Some("broken".to_string()),
            }]),
        );
        assert!(matches!(result, Err(TrumbaError::UnknownResponse { .. })));
    }

    #[test]
    fn code_3006_is_calendar_not_found() {
        let result = check_messages("req", &Some(vec![message(json!(3006))]));
        assert!(matches!(result, Err(TrumbaError::CalendarNotFound)));
    }

    #[test]
    fn code_3007_is_calendar_owned_by_a_different_account() {
        let result = check_messages("req", &Some(vec![message(json!(3007))]));
        assert!(matches!(
            result,
            Err(TrumbaError::CalendarOwnedByDiffAccount)
        ));
    }

    #[test]
    fn other_codes_are_unexpected() {
        let result = check_messages("req", &Some(vec![message(json!(3009))]));
        assert!(matches!(
            result,
            Err(TrumbaError::UnexpectedCode { code: 3009, .. })
        ));
    }

    #[test]
    fn string_codes_are_accepted() {
        let result = check_messages("req", &Some(vec![message(json!("3006"))]));
        assert!(matches!(result, Err(TrumbaError::CalendarNotFound)));
    }

    #[test]
    fn raw_calendar_tolerates_missing_fields() {
        let record: RawCalendar = serde_json::from_str(r#"{"Name": "Orphan"}"#).unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.name, "Orphan");
        assert!(record.child_calendars.is_none());
    }
}
