use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::json;

use crate::campus::Campus;
use crate::model::permission::Permission;

/// The support group granted admin access on every calendar.
pub const ADMIN_GROUP_NAME: &str = "u_eventcal_support";

const EDITOR_GROUP_DESC: &str =
    "Specifying the editors who can add/edit/delete events on this calendar";
const SHOWON_GROUP_DESC: &str =
    "Specifying the editor groups whose members have the showon permissions on this calendar";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupType {
    Editor,
    Showon,
}

impl GroupType {
    pub fn code(&self) -> &'static str {
        match self {
            GroupType::Editor => "editor",
            GroupType::Showon => "showon",
        }
    }
}

/// One vendor calendar within a campus namespace. Nested calendars carry
/// their ancestry in the name, joined by " >> ".
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    pub calendarid: i64,
    pub campus: Campus,
    pub name: String,
    pub permissions: HashMap<String, Permission>,
}

impl Calendar {
    pub fn new(calendarid: i64, campus: Campus, name: impl Into<String>) -> Calendar {
        Calendar {
            calendarid,
            campus,
            name: name.into(),
            permissions: HashMap::new(),
        }
    }

    /// Last write wins on a duplicate uwnetid.
    pub fn add_permission(&mut self, permission: Permission) {
        self.permissions
            .insert(permission.uwnetid.clone(), permission);
    }

    pub fn sorted_permissions(&self) -> Vec<&Permission> {
        let mut permissions: Vec<&Permission> = self.permissions.values().collect();
        permissions.sort_by(|a, b| a.display_order(b));
        permissions
    }

    /// Listing order for calendars: campus, then name, with the id as a
    /// final tiebreak.
    pub fn display_order(&self, other: &Calendar) -> Ordering {
        self.campus
            .cmp(&other.campus)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.calendarid.cmp(&other.calendarid))
    }

    pub fn group_admin() -> &'static str {
        ADMIN_GROUP_NAME
    }

    pub fn group_name(&self, gtype: GroupType) -> String {
        format!(
            "u_eventcal_{}_{}-{}",
            self.campus,
            self.calendarid,
            gtype.code()
        )
    }

    pub fn group_title(&self, gtype: GroupType) -> String {
        format!("{} calendar {} group", self.name, gtype.code())
    }

    pub fn group_desc(gtype: GroupType) -> &'static str {
        match gtype {
            GroupType::Editor => EDITOR_GROUP_DESC,
            GroupType::Showon => SHOWON_GROUP_DESC,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "calendarid": self.calendarid,
            "campus": self.campus.code(),
            "name": self.name,
            "permissions": self
                .sorted_permissions()
                .iter()
                .map(|p| p.to_json())
                .collect::<Vec<_>>(),
        })
    }
}
