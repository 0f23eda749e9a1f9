use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::campus::Campus;
use crate::client::ServiceClients;
use crate::error::{Result, TrumbaError};
use crate::model::Calendar;
use crate::permissions::Permissions;
use crate::response::{check_messages, ensure_body, CalendarListResponse, RawCalendar};

pub const GET_CALENDARLIST_URL: &str = "/service/calendars.asmx/GetCalendarList";

static EXCLUDED_NAME_RE: OnceLock<Regex> = OnceLock::new();

// Vendor-internal calendars that must never surface, children included.
fn excluded_name_pattern() -> &'static Regex {
    EXCLUDED_NAME_RE.get_or_init(|| {
        Regex::new(r"^(Internal Event Actions|Migrated )")
            .expect("invalid excluded-name regex")
    })
}

fn is_excluded_name(name: &str) -> bool {
    excluded_name_pattern().is_match(name)
}

fn is_valid_calendarid(calendarid: i64) -> bool {
    calendarid > 0
}

/// Flat per-campus directory of the vendor's nested calendar listings.
///
/// A calendar the primary campus lists is attributed to the primary campus
/// only: secondary campus listings drop every id the primary pass already
/// claimed. The dedup set lives on this instance and is rebuilt whenever
/// the primary campus is loaded, so one `Calendars` value corresponds to
/// one multi-campus load pass.
pub struct Calendars {
    campus_calendars: HashMap<Campus, HashMap<i64, Calendar>>,
    sea_calendar_ids: HashSet<i64>,
    permissions: Permissions,
}

impl Calendars {
    pub fn new() -> Calendars {
        Calendars {
            campus_calendars: HashMap::new(),
            sea_calendar_ids: HashSet::new(),
            permissions: Permissions::new(),
        }
    }

    /// Loads every campus, primary first so that shared calendars are
    /// attributed to the primary campus only.
    pub async fn load(clients: &ServiceClients) -> Result<Calendars> {
        let mut calendars = Calendars::new();
        for campus in Campus::ALL {
            calendars.load_campus(clients, campus).await?;
        }
        Ok(calendars)
    }

    /// Replaces one campus's flat map. On any fetch or envelope failure
    /// the campus entry is left unset rather than partially filled.
    /// Secondary campuses dedup against the most recent primary load.
    pub async fn load_campus(
        &mut self,
        clients: &ServiceClients,
        campus: Campus,
    ) -> Result<()> {
        let request_id = format!("{} {}", campus, GET_CALENDARLIST_URL);
        let response = clients
            .campus(campus)
            .post_json(GET_CALENDARLIST_URL, &serde_json::json!({}))
            .await?;

        let body = ensure_body(&request_id, &response)?;
        let parsed: CalendarListResponse = serde_json::from_str(body)?;
        let data = match parsed.d {
            Some(data) => data,
            None => {
                return Err(TrumbaError::NoDataReturned {
                    request: request_id,
                });
            }
        };
        check_messages(&request_id, &data.messages)?;

        if campus.is_primary() {
            self.sea_calendar_ids.clear();
        }

        let mut flat = HashMap::new();
        if let Some(records) = &data.calendars {
            self.flatten(campus, records, None, &mut flat);
        }
        for calendar in flat.values_mut() {
            self.permissions.get_cal_permissions(clients, calendar).await;
        }
        self.campus_calendars.insert(campus, flat);
        Ok(())
    }

    // Depth-first, pre-order. An excluded or malformed record hides its
    // whole subtree; a deduped record hides its subtree as well, since the
    // primary campus already walked it.
    fn flatten(
        &mut self,
        campus: Campus,
        records: &[RawCalendar],
        parent: Option<&str>,
        flat: &mut HashMap<i64, Calendar>,
    ) {
        for record in records {
            if is_excluded_name(&record.name) {
                tracing::warn!("Excluded calendar {:?}, subtree skipped", record.name);
                continue;
            }
            let calendarid = match record.id {
                Some(id) if is_valid_calendarid(id) => id,
                _ => {
                    tracing::warn!(
                        "InvalidCalendarId {:?} ({:?}), entry skipped",
                        record.id,
                        record.name
                    );
                    continue;
                }
            };
            if campus.is_primary() {
                self.sea_calendar_ids.insert(calendarid);
            } else if self.sea_calendar_ids.contains(&calendarid) {
                // shared from the primary campus; not listed again here
                continue;
            }

            let name = match parent {
                Some(parent) => format!("{} >> {}", parent, record.name),
                None => record.name.clone(),
            };
            flat.insert(calendarid, Calendar::new(calendarid, campus, name.clone()));

            if let Some(children) = &record.child_calendars {
                if !children.is_empty() {
                    self.flatten(campus, children, Some(name.as_str()), flat);
                }
            }
        }
    }

    /// True when the campus has been loaded and holds at least one calendar.
    pub fn exists(&self, campus: Campus) -> bool {
        self.campus_calendars
            .get(&campus)
            .is_some_and(|map| !map.is_empty())
    }

    pub fn has_calendar(&self, campus: Campus, calendarid: i64) -> bool {
        self.get_calendar(campus, calendarid).is_some()
    }

    pub fn get_calendar(&self, campus: Campus, calendarid: i64) -> Option<&Calendar> {
        self.campus_calendars.get(&campus)?.get(&calendarid)
    }

    /// The campus's calendars sorted by `(campus, name)`; `None` until the
    /// campus has been loaded.
    pub fn get_campus_calendars(&self, campus: Campus) -> Option<Vec<&Calendar>> {
        let map = self.campus_calendars.get(&campus)?;
        let mut calendars: Vec<&Calendar> = map.values().collect();
        calendars.sort_by(|a, b| a.display_order(b));
        Some(calendars)
    }

    pub fn total_calendars(&self, campus: Campus) -> usize {
        self.campus_calendars.get(&campus).map_or(0, HashMap::len)
    }

    pub fn total_accounts(&self) -> usize {
        self.permissions.total_accounts()
    }

    pub fn account_exists(&self, uwnetid: &str) -> bool {
        self.permissions.account_exists(uwnetid)
    }
}

impl Default for Calendars {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::{CampusClient, FeedClient};
    use crate::permissions::GET_PERMISSIONS_URL;

    fn parse_records(json_str: &str) -> Vec<RawCalendar> {
        serde_json::from_str(json_str).unwrap()
    }

    fn flatten_for(calendars: &mut Calendars, campus: Campus, records: &str) -> HashMap<i64, Calendar> {
        let records = parse_records(records);
        let mut flat = HashMap::new();
        calendars.flatten(campus, &records, None, &mut flat);
        flat
    }

    #[test]
    fn nested_calendars_get_chained_names() {
        let mut calendars = Calendars::new();
        let flat = flatten_for(
            &mut calendars,
            Campus::Sea,
            r#"[{"ID": 1, "Name": "Seattle calendar",
                 "ChildCalendars": [{"ID": 2, "Name": "Child1", "ChildCalendars": null}]}]"#,
        );

        assert_eq!(flat.len(), 2);
        assert_eq!(flat[&1].name, "Seattle calendar");
        assert_eq!(flat[&2].name, "Seattle calendar >> Child1");
    }

    #[test]
    fn deep_nesting_chains_every_ancestor() {
        let mut calendars = Calendars::new();
        let flat = flatten_for(
            &mut calendars,
            Campus::Sea,
            r#"[{"ID": 1, "Name": "A", "ChildCalendars":
                 [{"ID": 2, "Name": "B", "ChildCalendars":
                   [{"ID": 3, "Name": "C"}]}]}]"#,
        );

        assert_eq!(flat[&3].name, "A >> B >> C");
    }

    #[test]
    fn excluded_names_hide_the_whole_subtree() {
        let mut calendars = Calendars::new();
        let flat = flatten_for(
            &mut calendars,
            Campus::Sea,
            r#"[{"ID": 5, "Name": "Internal Event Actions",
                 "ChildCalendars": [{"ID": 6, "Name": "A"}, {"ID": 7, "Name": "B"}]},
                {"ID": 8, "Name": "Migrated old events"},
                {"ID": 9, "Name": "Kept"}]"#,
        );

        assert_eq!(flat.len(), 1);
        assert!(flat.contains_key(&9));
    }

    #[test]
    fn invalid_ids_drop_the_record_and_its_children() {
        let mut calendars = Calendars::new();
        let flat = flatten_for(
            &mut calendars,
            Campus::Sea,
            r#"[{"ID": 0, "Name": "Zero", "ChildCalendars": [{"ID": 10, "Name": "Under zero"}]},
                {"ID": -1, "Name": "Negative"},
                {"Name": "Missing id"},
                {"ID": 11, "Name": "Kept"}]"#,
        );

        assert_eq!(flat.len(), 1);
        assert!(flat.contains_key(&11));
    }

    #[test]
    fn is_valid_calendarid_requires_a_positive_integer() {
        assert!(is_valid_calendarid(1));
        assert!(!is_valid_calendarid(0));
        assert!(!is_valid_calendarid(-1));
    }

    #[test]
    fn secondary_campuses_drop_ids_the_primary_already_claimed() {
        let mut calendars = Calendars::new();
        let sea = flatten_for(
            &mut calendars,
            Campus::Sea,
            r#"[{"ID": 1, "Name": "Seattle calendar"}]"#,
        );
        let bot = flatten_for(
            &mut calendars,
            Campus::Bot,
            r#"[{"ID": 1, "Name": "Seattle calendar",
                 "ChildCalendars": [{"ID": 2, "Name": "Shared child"}]},
                {"ID": 31, "Name": "Bothell calendar"}]"#,
        );

        assert!(sea.contains_key(&1));
        assert!(!bot.contains_key(&1));
        // the shared subtree is not revisited under the secondary campus
        assert!(!bot.contains_key(&2));
        assert_eq!(bot.len(), 1);
        assert!(bot.contains_key(&31));
    }

    #[test]
    fn flattening_the_same_records_twice_is_idempotent() {
        let records = r#"[{"ID": 1, "Name": "Seattle calendar",
                           "ChildCalendars": [{"ID": 2, "Name": "Child1"}]}]"#;
        let mut calendars = Calendars::new();
        let first = flatten_for(&mut calendars, Campus::Sea, records);
        let second = flatten_for(&mut calendars, Campus::Sea, records);

        assert_eq!(first, second);
    }

    async fn mock_campus(list_body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GET_CALENDARLIST_URL))
            .respond_with(ResponseTemplate::new(200).set_body_string(list_body.to_string()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(GET_PERMISSIONS_URL))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                serde_json::json!({"d": {"Users": [
                    {"Email": "dummyp@washington.edu", "Name": "Dummy publisher", "Level": "PUBLISH"},
                ]}})
                .to_string(),
            ))
            .mount(&server)
            .await;
        server
    }

    fn clients(sea: &MockServer, bot: &MockServer, tac: &MockServer) -> ServiceClients {
        ServiceClients::new(
            CampusClient::new(Campus::Sea, sea.uri(), "u", "p"),
            CampusClient::new(Campus::Bot, bot.uri(), "u", "p"),
            CampusClient::new(Campus::Tac, tac.uri(), "u", "p"),
            FeedClient::new(sea.uri()),
        )
    }

    #[tokio::test]
    async fn load_attributes_shared_calendars_to_the_primary_campus() {
        let sea = mock_campus(serde_json::json!({"d": {"Calendars": [
            {"ID": 1, "Name": "Seattle calendar",
             "ChildCalendars": [{"ID": 2, "Name": "Child1"}]},
        ]}}))
        .await;
        let bot = mock_campus(serde_json::json!({"d": {"Calendars": [
            {"ID": 1, "Name": "Seattle calendar"},
            {"ID": 31, "Name": "Bothell calendar"},
        ]}}))
        .await;
        let tac = mock_campus(serde_json::json!({"d": {"Calendars": [
            {"ID": 41, "Name": "Tacoma calendar"},
        ]}}))
        .await;

        let calendars = Calendars::load(&clients(&sea, &bot, &tac)).await.unwrap();

        assert_eq!(calendars.total_calendars(Campus::Sea), 2);
        assert_eq!(calendars.total_calendars(Campus::Bot), 1);
        assert_eq!(calendars.total_calendars(Campus::Tac), 1);

        assert!(calendars.has_calendar(Campus::Sea, 1));
        assert!(!calendars.has_calendar(Campus::Bot, 1));
        assert_eq!(
            calendars.get_calendar(Campus::Sea, 2).unwrap().name,
            "Seattle calendar >> Child1"
        );

        // permission fan-out ran for every kept calendar
        let child = calendars.get_calendar(Campus::Sea, 2).unwrap();
        assert_eq!(child.permissions["dummyp"].uwnetid, "dummyp");
        assert!(calendars.account_exists("dummyp"));
        assert_eq!(calendars.total_accounts(), 1);

        let sorted = calendars.get_campus_calendars(Campus::Sea).unwrap();
        assert_eq!(sorted[0].name, "Seattle calendar");
        assert_eq!(sorted[1].name, "Seattle calendar >> Child1");
    }

    #[tokio::test]
    async fn a_failed_permission_load_does_not_abort_the_campus() {
        let sea = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GET_CALENDARLIST_URL))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                serde_json::json!({"d": {"Calendars": [{"ID": 1, "Name": "Seattle calendar"}]}})
                    .to_string(),
            ))
            .mount(&sea)
            .await;
        Mock::given(method("POST"))
            .and(path(GET_PERMISSIONS_URL))
            .respond_with(ResponseTemplate::new(500))
            .mount(&sea)
            .await;
        let bot = mock_campus(serde_json::json!({"d": {"Calendars": []}})).await;
        let tac = mock_campus(serde_json::json!({"d": {"Calendars": []}})).await;

        let calendars = Calendars::load(&clients(&sea, &bot, &tac)).await.unwrap();

        assert_eq!(calendars.total_calendars(Campus::Sea), 1);
        assert!(calendars
            .get_calendar(Campus::Sea, 1)
            .unwrap()
            .permissions
            .is_empty());
    }

    #[tokio::test]
    async fn a_failed_list_fetch_leaves_the_campus_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GET_CALENDARLIST_URL))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let clients = clients(&server, &server, &server);
        let mut calendars = Calendars::new();
        let result = calendars.load_campus(&clients, Campus::Sea).await;

        assert!(matches!(
            result,
            Err(TrumbaError::DataFailure { status: 500, .. })
        ));
        assert!(!calendars.exists(Campus::Sea));
        assert_eq!(calendars.total_calendars(Campus::Sea), 0);
        assert_eq!(calendars.get_campus_calendars(Campus::Sea), None);
    }

    #[tokio::test]
    async fn a_missing_d_wrapper_is_no_data_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GET_CALENDARLIST_URL))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"d": null}"#))
            .mount(&server)
            .await;

        let clients = clients(&server, &server, &server);
        let mut calendars = Calendars::new();
        let result = calendars.load_campus(&clients, Campus::Tac).await;

        assert!(matches!(result, Err(TrumbaError::NoDataReturned { .. })));
    }

    #[tokio::test]
    async fn an_empty_calendar_list_loads_as_an_empty_campus() {
        let server = mock_campus(serde_json::json!({"d": {"Calendars": null}})).await;
        let clients = clients(&server, &server, &server);
        let mut calendars = Calendars::new();

        calendars.load_campus(&clients, Campus::Bot).await.unwrap();

        assert!(!calendars.exists(Campus::Bot));
        assert_eq!(calendars.get_campus_calendars(Campus::Bot), Some(vec![]));
    }
}
