use quick_xml::Reader;
use quick_xml::events::Event;

use crate::campus::Campus;
use crate::client::{HttpResponse, ServiceClients};
use crate::error::{Result, TrumbaError};
use crate::model::permission::USER_DOMAIN;
use crate::model::{Calendar, PermissionLevel};
use crate::response::ensure_body;

pub const ADD_ACCOUNT_URL: &str = "/service/accounts.asmx/CreateEditor";
pub const DEL_ACCOUNT_URL: &str = "/service/accounts.asmx/CloseEditor";
pub const SET_PERMISSION_URL: &str = "/service/calendars.asmx/SetPermissions";

fn make_add_account_url(name: &str, userid: &str) -> String {
    format!(
        "{}?Name={}&Email={}@{}&Password=",
        ADD_ACCOUNT_URL,
        urlencoding::encode(name),
        userid,
        USER_DOMAIN
    )
}

fn make_del_account_url(userid: &str) -> String {
    format!("{}?Email={}@{}", DEL_ACCOUNT_URL, userid, USER_DOMAIN)
}

fn make_set_permissions_url(calendarid: i64, userid: &str, level: PermissionLevel) -> String {
    format!(
        "{}?CalendarID={}&Email={}@{}&Level={}",
        SET_PERMISSION_URL,
        calendarid,
        userid,
        USER_DOMAIN,
        level.code()
    )
}

/// Creates a vendor editor account. Editor accounts live on the primary
/// campus service.
pub async fn add_editor(clients: &ServiceClients, name: &str, userid: &str) -> Result<()> {
    let url = make_add_account_url(name, userid);
    let response = clients.campus(Campus::Sea).get(&url).await?;
    process_response(&url, &response, is_editor_added)
}

/// Closes a vendor editor account.
pub async fn delete_editor(clients: &ServiceClients, userid: &str) -> Result<()> {
    let url = make_del_account_url(userid);
    let response = clients.campus(Campus::Sea).get(&url).await?;
    process_response(&url, &response, is_editor_deleted)
}

/// Sets one account's permission level on one calendar, routed through the
/// calendar's campus service.
pub async fn set_permissions(
    clients: &ServiceClients,
    campus: Campus,
    calendarid: i64,
    userid: &str,
    level: PermissionLevel,
) -> Result<()> {
    let url = make_set_permissions_url(calendarid, userid, level);
    let response = clients.campus(campus).get(&url).await?;
    process_response(&url, &response, is_permission_set)
}

pub async fn set_perm_editor(
    clients: &ServiceClients,
    calendar: &Calendar,
    userid: &str,
) -> Result<()> {
    set_permissions(
        clients,
        calendar.campus,
        calendar.calendarid,
        userid,
        PermissionLevel::Edit,
    )
    .await
}

pub async fn set_perm_showon(
    clients: &ServiceClients,
    calendar: &Calendar,
    userid: &str,
) -> Result<()> {
    set_permissions(
        clients,
        calendar.campus,
        calendar.calendarid,
        userid,
        PermissionLevel::Showon,
    )
    .await
}

pub async fn set_perm_none(
    clients: &ServiceClients,
    calendar: &Calendar,
    userid: &str,
) -> Result<()> {
    set_permissions(
        clients,
        calendar.campus,
        calendar.calendarid,
        userid,
        PermissionLevel::None,
    )
    .await
}

fn process_response(
    request_id: &str,
    response: &HttpResponse,
    is_success: fn(i64) -> bool,
) -> Result<()> {
    let body = ensure_body(request_id, response)?;
    let code = match extract_response_code(body)? {
        Some(code) => code,
        None => {
            return Err(TrumbaError::UnknownResponse {
                request: request_id.to_string(),
            });
        }
    };
    if is_success(code) {
        return Ok(());
    }
    Err(check_err(code, request_id))
}

/// Reads the `Code` attribute off the `ResponseMessage` element of an
/// accounts-service XML body.
fn extract_response_code(body: &str) -> Result<Option<i64>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"ResponseMessage" =>
            {
                let attr = e
                    .try_get_attribute("Code")
                    .map_err(|err| TrumbaError::Xml(err.to_string()))?;
                return Ok(attr
                    .and_then(|a| String::from_utf8_lossy(&a.value).parse::<i64>().ok()));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(err) => return Err(TrumbaError::Xml(err.to_string())),
            _ => {}
        }
    }
}

fn is_editor_added(code: i64) -> bool {
    code == 1001 || code == 3012
}

fn is_editor_deleted(code: i64) -> bool {
    code == 1002
}

fn is_permission_set(code: i64) -> bool {
    code == 1003
}

fn check_err(code: i64, request_id: &str) -> TrumbaError {
    match code {
        3006 => TrumbaError::CalendarNotFound,
        3007 => TrumbaError::CalendarOwnedByDiffAccount,
        3008 => TrumbaError::AccountNotFound,
        3009 | 3013 => TrumbaError::AccountUsedByDiffUser,
        3010 => TrumbaError::InvalidPermissionLevel,
        3011 => TrumbaError::FailedToClosePublisher,
        3014 => TrumbaError::InvalidEmail,
        3015 => TrumbaError::NoAllowedPermission,
        3016 => TrumbaError::AccountNameEmpty,
        3017 | 3018 => TrumbaError::ErrorCreatingEditor,
        _ => {
            tracing::error!("Unexpected error code {} with {}", code, request_id);
            TrumbaError::UnexpectedCode {
                request: request_id.to_string(),
                code,
            }
        }
    }
}
