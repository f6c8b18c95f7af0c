//! Parsing of the raw group-creation form.

use serde::{Deserialize, Deserializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

use crate::domain::group::NewGroup;
use crate::domain::timezone;
use crate::errors::domain::DomainError;

const DATE_INPUT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const CLOCK_INPUT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour padding:none]:[minute]");
const DEADLINE_INPUT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour padding:none]:[minute]");

/// Raw form fields exactly as submitted. Every field is optional here so
/// that a missing one is reported by name instead of as a JSON error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGroupForm {
    #[serde(default, deserialize_with = "text_or_number")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub retreat_deadline: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub single_limit: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub double_limit: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub pin: Option<String>,
}

/// Accept `"8"` and `8` alike; form posts send text, JSON clients may not.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    }))
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, DomainError> {
    value
        .as_deref()
        .ok_or_else(|| DomainError::validation(format!("Missing field: {field}")))
}

fn invalid(field: &str, expected: &str) -> DomainError {
    DomainError::validation(format!("Invalid {field}: expected {expected}"))
}

fn parse_limit(value: &Option<String>, field: &str) -> Result<u32, DomainError> {
    required(value, field)?
        .trim()
        .parse::<u32>()
        .map_err(|_| invalid(field, "a non-negative integer"))
}

fn parse_clock(value: &Option<String>, field: &str) -> Result<Time, DomainError> {
    Time::parse(required(value, field)?.trim(), CLOCK_INPUT).map_err(|_| invalid(field, "HH:MM"))
}

/// Validate every field and convert local wall-clock inputs to UTC.
pub fn parse_new_group(form: &CreateGroupForm) -> Result<NewGroup, DomainError> {
    let location = required(&form.location, "location")?.trim();
    if location.is_empty() {
        return Err(DomainError::validation("Location must not be empty"));
    }

    let description = form
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_owned);

    let date = Date::parse(required(&form.date, "date")?.trim(), DATE_INPUT)
        .map_err(|_| invalid("date", "YYYY-MM-DD"))?;
    let start = parse_clock(&form.start_time, "start_time")?;
    let end = parse_clock(&form.end_time, "end_time")?;
    let deadline = PrimitiveDateTime::parse(
        required(&form.retreat_deadline, "retreat_deadline")?.trim(),
        DEADLINE_INPUT,
    )
    .map_err(|_| invalid("retreat_deadline", "YYYY-MM-DDTHH:MM"))?;

    let single_limit = parse_limit(&form.single_limit, "single_limit")?;
    let double_limit = parse_limit(&form.double_limit, "double_limit")?;
    let pin = required(&form.pin, "pin")?.to_string();

    Ok(NewGroup {
        location: location.to_string(),
        description,
        start_time: timezone::from_local(date.with_time(start)),
        end_time: timezone::from_local(date.with_time(end)),
        retreat_deadline: timezone::from_local(deadline),
        single_limit,
        double_limit,
        pin,
    })
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn valid_form() -> CreateGroupForm {
        CreateGroupForm {
            location: Some("  Bellevue Badminton Club ".into()),
            description: Some("Friday social".into()),
            date: Some("2023-10-14".into()),
            start_time: Some("19:30".into()),
            end_time: Some("21:30".into()),
            retreat_deadline: Some("2023-10-14T12:00".into()),
            single_limit: Some("8".into()),
            double_limit: Some("0".into()),
            pin: Some("4321".into()),
        }
    }

    fn validation_message(form: &CreateGroupForm) -> String {
        match parse_new_group(form) {
            Err(DomainError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn parses_local_times_into_utc() {
        let group = parse_new_group(&valid_form()).unwrap();
        assert_eq!(group.location, "Bellevue Badminton Club");
        assert_eq!(group.description.as_deref(), Some("Friday social"));
        assert_eq!(group.start_time, datetime!(2023-10-15 2:30 UTC));
        assert_eq!(group.end_time, datetime!(2023-10-15 4:30 UTC));
        assert_eq!(group.retreat_deadline, datetime!(2023-10-14 19:00 UTC));
        assert_eq!(group.single_limit, 8);
        assert_eq!(group.double_limit, 0);
        assert_eq!(group.pin, "4321");
    }

    #[test]
    fn single_digit_hours_are_accepted() {
        let mut form = valid_form();
        form.start_time = Some("9:30".into());
        form.end_time = Some("11:00".into());
        form.retreat_deadline = Some("2023-10-14T8:00".into());

        let group = parse_new_group(&form).unwrap();
        assert_eq!(group.start_time, datetime!(2023-10-14 16:30 UTC));
        assert_eq!(group.end_time, datetime!(2023-10-14 18:00 UTC));
        assert_eq!(group.retreat_deadline, datetime!(2023-10-14 15:00 UTC));
    }

    #[test]
    fn missing_field_is_named() {
        let mut form = valid_form();
        form.retreat_deadline = None;
        assert_eq!(validation_message(&form), "Missing field: retreat_deadline");
    }

    #[test]
    fn unparsable_fields_are_named() {
        let mut form = valid_form();
        form.start_time = Some("7:30pm".into());
        assert!(validation_message(&form).contains("start_time"));

        let mut form = valid_form();
        form.date = Some("14/10/2023".into());
        assert!(validation_message(&form).contains("date"));

        let mut form = valid_form();
        form.double_limit = Some("-1".into());
        assert!(validation_message(&form).contains("double_limit"));
    }

    #[test]
    fn blank_location_is_rejected_and_blank_description_dropped() {
        let mut form = valid_form();
        form.location = Some("   ".into());
        assert!(validation_message(&form).contains("Location"));

        let mut form = valid_form();
        form.description = Some("  ".into());
        assert_eq!(parse_new_group(&form).unwrap().description, None);
    }

    #[test]
    fn numeric_json_limits_are_accepted() {
        let form: CreateGroupForm = serde_json::from_value(serde_json::json!({
            "location": "Gym",
            "date": "2024-01-06",
            "start_time": "09:00",
            "end_time": "11:00",
            "retreat_deadline": "2024-01-05T20:00",
            "single_limit": 4,
            "double_limit": "6",
            "pin": 1234
        }))
        .unwrap();

        let group = parse_new_group(&form).unwrap();
        assert_eq!(group.single_limit, 4);
        assert_eq!(group.double_limit, 6);
        assert_eq!(group.pin, "1234");
        assert_eq!(group.start_time, datetime!(2024-01-06 17:00 UTC));
    }
}
