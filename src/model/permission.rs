use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Domain appended to every institutional user id on the vendor side.
pub const USER_DOMAIN: &str = "washington.edu";

/// Access level of one account on one calendar, as reported by the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionLevel {
    Publish,
    Edit,
    Republish,
    Showon,
    View,
    None,
}

impl PermissionLevel {
    pub fn from_code(code: &str) -> Option<PermissionLevel> {
        match code {
            "PUBLISH" => Some(PermissionLevel::Publish),
            "EDIT" => Some(PermissionLevel::Edit),
            "REPUBLISH" => Some(PermissionLevel::Republish),
            "SHOWON" => Some(PermissionLevel::Showon),
            "VIEW" => Some(PermissionLevel::View),
            "NONE" => Some(PermissionLevel::None),
            _ => Option::None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PermissionLevel::Publish => "PUBLISH",
            PermissionLevel::Edit => "EDIT",
            PermissionLevel::Republish => "REPUBLISH",
            PermissionLevel::Showon => "SHOWON",
            PermissionLevel::View => "VIEW",
            PermissionLevel::None => "NONE",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PermissionLevel::Publish => "Can view, edit and publish",
            PermissionLevel::Edit => "Can add, delete and change content",
            PermissionLevel::Republish => "Can view, edit and republish",
            PermissionLevel::Showon => "Can view and show on",
            PermissionLevel::View => "Can view content",
            PermissionLevel::None => "None",
        }
    }

    // The vendor does not document a total order over levels. REPUBLISH is
    // ranked immediately below EDIT, matching its "can view, edit and
    // republish" description.
    fn rank(&self) -> u8 {
        match self {
            PermissionLevel::Publish => 5,
            PermissionLevel::Edit => 4,
            PermissionLevel::Republish => 3,
            PermissionLevel::Showon => 2,
            PermissionLevel::View => 1,
            PermissionLevel::None => 0,
        }
    }

    pub fn is_higher(&self, other: PermissionLevel) -> bool {
        self.rank() > other.rank()
    }

    /// Listing order for levels: higher access sorts first.
    pub fn cmp_display(&self, other: &PermissionLevel) -> Ordering {
        other.rank().cmp(&self.rank())
    }

    pub fn in_editor_group(&self) -> bool {
        matches!(self, PermissionLevel::Edit | PermissionLevel::Publish)
    }

    pub fn in_showon_group(&self) -> bool {
        matches!(self, PermissionLevel::Showon | PermissionLevel::Republish)
    }
}

impl Default for PermissionLevel {
    fn default() -> Self {
        PermissionLevel::View
    }
}

/// One account's access to one calendar. Owned by the calendar's permission
/// map, keyed by `uwnetid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub uwnetid: String,
    pub display_name: Option<String>,
    pub level: PermissionLevel,
}

impl Permission {
    pub fn new(
        uwnetid: impl Into<String>,
        display_name: Option<String>,
        level: PermissionLevel,
    ) -> Permission {
        Permission {
            uwnetid: uwnetid.into(),
            display_name,
            level,
        }
    }

    /// The vendor-side account id for this user.
    pub fn trumba_userid(&self) -> String {
        format!("{}@{}", self.uwnetid, USER_DOMAIN)
    }

    pub fn is_publish(&self) -> bool {
        self.level == PermissionLevel::Publish
    }

    pub fn is_edit(&self) -> bool {
        self.level == PermissionLevel::Edit || self.is_publish()
    }

    pub fn is_republish(&self) -> bool {
        self.level == PermissionLevel::Republish
    }

    pub fn is_showon(&self) -> bool {
        self.level == PermissionLevel::Showon || self.is_republish()
    }

    pub fn is_view(&self) -> bool {
        self.level == PermissionLevel::View
    }

    pub fn is_higher_permission(&self, level: PermissionLevel) -> bool {
        self.level.is_higher(level)
    }

    pub fn in_editor_group(&self) -> bool {
        self.level.in_editor_group()
    }

    pub fn in_showon_group(&self) -> bool {
        self.level.in_showon_group()
    }

    /// Listing order: level rank descending, uwnetid ascending among equals.
    pub fn display_order(&self, other: &Permission) -> Ordering {
        self.level
            .cmp_display(&other.level)
            .then_with(|| self.uwnetid.cmp(&other.uwnetid))
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "uwnetid": self.uwnetid,
            "name": self.display_name,
            "level": self.level.code(),
        })
    }
}
