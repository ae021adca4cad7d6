use serde::Deserialize;
use time::Date;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct MarkCompleteRequest {
    #[serde(with = "super::iso_date")]
    pub date: Date,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default, with = "super::iso_date::option")]
    pub from: Option<Date>,
    #[serde(default, with = "super::iso_date::option")]
    pub to: Option<Date>,
}

/// Parses a `YYYY-MM-DD` path segment.
pub fn parse_date(raw: &str) -> AppResult<Date> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(raw, &format).map_err(|_| AppError::validation("date must be YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn dates_parse_from_body_and_path() {
        let req: MarkCompleteRequest = serde_json::from_str(r#"{"date":"2025-02-03"}"#).unwrap();
        assert_eq!(req.date, date!(2025 - 02 - 03));

        assert!(serde_json::from_str::<MarkCompleteRequest>("{}").is_err());
        assert!(serde_json::from_str::<MarkCompleteRequest>(r#"{"date":"03/02/2025"}"#).is_err());

        let range: RangeQuery = serde_json::from_str(r#"{"to":"2025-02-03"}"#).unwrap();
        assert!(range.from.is_none());
        assert_eq!(range.to, Some(date!(2025 - 02 - 03)));

        assert_eq!(parse_date("2025-02-03").unwrap(), date!(2025 - 02 - 03));
        assert!(parse_date("03/02/2025").is_err());
    }
}
