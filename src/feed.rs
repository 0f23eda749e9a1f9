use icalendar::{Calendar as IcalCalendar, CalendarComponent, Event as IcalEvent};

use crate::client::FeedClient;
use crate::error::{Result, TrumbaError};
use crate::response::ensure_body;

/// Fetches a published calendar feed by name and parses it. A body that is
/// not valid iCalendar is an error, never a silently empty calendar.
pub async fn get_calendar_by_name(
    client: &FeedClient,
    calendar_name: &str,
) -> Result<IcalCalendar> {
    let url = format!("/calendars/{}.ics", calendar_name);
    let response = client.get(&url).await?;
    let body = ensure_body(&url, &response)?;
    body.parse::<IcalCalendar>().map_err(TrumbaError::Ical)
}

/// The VEVENT components of a parsed feed.
pub fn events(calendar: &IcalCalendar) -> Vec<&IcalEvent> {
    calendar
        .components
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => Some(event),
            _ => None,
        })
        .collect()
}
