use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use crate::client::ServiceClients;
use crate::error::{Result, TrumbaError};
use crate::model::{Calendar, Permission, PermissionLevel};
use crate::response::{check_messages, ensure_body, PermissionsResponse, RawUser};

pub const GET_PERMISSIONS_URL: &str = "/service/calendars.asmx/GetPermissions";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9._-]{0,127}@washington\.edu$")
            .expect("invalid email regex")
    })
}

/// Only institutional accounts are modeled; everything else is skipped.
fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

fn extract_uwnetid(email: &str) -> &str {
    email.strip_suffix("@washington.edu").unwrap_or(email)
}

/// Loads per-calendar permission sets and tracks every institutional
/// account seen across them.
#[derive(Debug, Default)]
pub struct Permissions {
    account_set: HashSet<String>,
}

impl Permissions {
    pub fn new() -> Permissions {
        Permissions {
            account_set: HashSet::new(),
        }
    }

    pub fn account_exists(&self, uwnetid: &str) -> bool {
        self.account_set.contains(uwnetid)
    }

    pub fn total_accounts(&self) -> usize {
        self.account_set.len()
    }

    fn add_account(&mut self, uwnetid: &str) {
        if !self.account_exists(uwnetid) {
            self.account_set.insert(uwnetid.to_string());
        }
    }

    /// Fills the calendar's permission map from the vendor. A failure here
    /// is logged and leaves the calendar without permissions; it never
    /// aborts a campus load.
    pub async fn get_cal_permissions(
        &mut self,
        clients: &ServiceClients,
        calendar: &mut Calendar,
    ) {
        match self.fetch_permissions(clients, calendar).await {
            Ok(Some(users)) => self.load_permissions(calendar, &users),
            Ok(None) => {}
            Err(err) => {
                tracing::error!(
                    "get_cal_permissions on {} {} ==> {}",
                    calendar.campus,
                    calendar.calendarid,
                    err
                );
            }
        }
    }

    async fn fetch_permissions(
        &self,
        clients: &ServiceClients,
        calendar: &Calendar,
    ) -> Result<Option<Vec<RawUser>>> {
        let request_id = format!(
            "{} {} CalendarID:{}",
            calendar.campus, GET_PERMISSIONS_URL, calendar.calendarid
        );
        let response = clients
            .campus(calendar.campus)
            .post_json(
                GET_PERMISSIONS_URL,
                &json!({ "CalendarID": calendar.calendarid }),
            )
            .await?;

        let body = ensure_body(&request_id, &response)?;
        let parsed: PermissionsResponse = serde_json::from_str(body)?;
        let data = match parsed.d {
            Some(data) => data,
            None => {
                return Err(TrumbaError::NoDataReturned {
                    request: request_id,
                });
            }
        };
        check_messages(&request_id, &data.messages)?;
        Ok(data.users)
    }

    fn load_permissions(&mut self, calendar: &mut Calendar, users: &[RawUser]) {
        for record in users {
            let email = match &record.email {
                Some(email) if is_valid_email(email) => email,
                // not an institutional account
                _ => continue,
            };
            let uwnetid = extract_uwnetid(email).to_string();
            let level = match record.level.as_deref().and_then(PermissionLevel::from_code) {
                Some(level) => level,
                None => {
                    tracing::warn!(
                        "Unknown permission level {:?} for {}, defaulting to VIEW",
                        record.level,
                        uwnetid
                    );
                    PermissionLevel::View
                }
            };
            calendar.add_permission(Permission::new(
                uwnetid.clone(),
                record.name.clone(),
                level,
            ));
            self.add_account(&uwnetid);
        }
    }
}
