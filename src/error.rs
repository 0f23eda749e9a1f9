use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrumbaError>;

/// Failures surfaced by the vendor services. Transport-level problems carry
/// the identity of the request that hit them; business-rule violations map
/// one-to-one onto the vendor's response codes.
#[derive(Debug, Error)]
pub enum TrumbaError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{request} failed: {status} {reason}")]
    DataFailure {
        request: String,
        status: u16,
        reason: String,
    },

    #[error("no data returned for {request}")]
    NoDataReturned { request: String },

    #[error("response without a result code for {request}")]
    UnknownResponse { request: String },

    #[error("unexpected error code {code} for {request}")]
    UnexpectedCode { request: String, code: i64 },

    /// Vendor code 3006.
    #[error("calendar does not exist")]
    CalendarNotFound,

    /// Vendor code 3007.
    #[error("calendar is owned by a different account")]
    CalendarOwnedByDiffAccount,

    /// Vendor code 3008.
    #[error("account has not been created")]
    AccountNotFound,

    /// Vendor codes 3009 and 3013.
    #[error("account is already used by another user")]
    AccountUsedByDiffUser,

    /// Vendor code 3010.
    #[error("permission level is not valid")]
    InvalidPermissionLevel,

    /// Vendor code 3011.
    #[error("cannot close a publisher account")]
    FailedToClosePublisher,

    /// Vendor code 3014.
    #[error("email address is not valid")]
    InvalidEmail,

    /// Vendor code 3015.
    #[error("permission level is not allowed for this account")]
    NoAllowedPermission,

    /// Vendor code 3016.
    #[error("account name is empty")]
    AccountNameEmpty,

    /// Vendor codes 3017 and 3018.
    #[error("failed to create the editor account")]
    ErrorCreatingEditor,

    #[error("failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse XML response: {0}")]
    Xml(String),

    #[error("failed to parse iCalendar feed: {0}")]
    Ical(String),
}
