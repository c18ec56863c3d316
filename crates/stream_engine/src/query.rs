use chrono::{Months, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Timestamp layout the search API expects for `from` and `to`.
pub const REMOTE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Filter arguments as supplied by the activity list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchArgs {
    pub search: Option<String>,
    pub object_id: Option<i64>,
    pub user_id: Option<i64>,
    pub user_role: Option<String>,
    pub connector: Option<String>,
    pub context: Option<String>,
    pub action: Option<String>,
    /// Single day, `YYYY-MM-DD`; overrides `date_from`/`date_to`.
    pub date: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub free_text: String,
    pub site_scope: String,
    pub object_id: Option<i64>,
    pub user_id: Option<i64>,
    pub user_role: Option<String>,
    pub connector: Option<String>,
    pub context: Option<String>,
    pub action: Option<String>,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

/// JSON body of the job submission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitBody {
    pub query: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl SearchQuery {
    /// Builds a query from filter args. `now` is the local wall-clock time.
    pub fn from_args(args: &SearchArgs, site_scope: &str, now: NaiveDateTime) -> Self {
        let (from, to) = search_interval(args, now);
        Self {
            free_text: trimmed(&args.search).unwrap_or_default(),
            site_scope: site_scope.trim().to_string(),
            object_id: args.object_id,
            user_id: args.user_id,
            user_role: trimmed(&args.user_role),
            connector: trimmed(&args.connector),
            context: trimmed(&args.context),
            action: trimmed(&args.action),
            from,
            to,
        }
    }

    /// Present filters as `(field, value)`; an empty field name marks a bare term.
    pub fn filters(&self) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if !self.site_scope.is_empty() {
            filters.push(("site", self.site_scope.clone()));
        }
        if !self.free_text.is_empty() {
            filters.push(("", self.free_text.clone()));
        }
        if let Some(id) = self.object_id {
            filters.push(("object_id", id.to_string()));
        }
        if let Some(id) = self.user_id {
            filters.push(("user_id", id.to_string()));
        }
        let named = [
            ("user_role", &self.user_role),
            ("connector", &self.connector),
            ("context", &self.context),
            ("action", &self.action),
        ];
        for (field, value) in named {
            if let Some(value) = value {
                filters.push((field, value.clone()));
            }
        }
        filters
    }

    /// Remote query string: the base expression AND-combined with each filter.
    pub fn remote_query(&self, base: &str) -> String {
        let mut terms = Vec::new();
        let base = base.trim();
        if !base.is_empty() {
            terms.push(base.to_string());
        }
        for (field, value) in self.filters() {
            let quoted = format!("\"{}\"", escape_quotes(&value));
            if field.is_empty() {
                terms.push(quoted);
            } else {
                terms.push(format!("{field}={quoted}"));
            }
        }
        terms.join(" AND ")
    }

    pub fn submit_body(&self, base: &str, time_zone: &str) -> SubmitBody {
        SubmitBody {
            query: self.remote_query(base),
            from: self.from.format(REMOTE_TIME_FORMAT).to_string(),
            to: self.to.format(REMOTE_TIME_FORMAT).to_string(),
            time_zone: time_zone.to_string(),
        }
    }
}

/// Search window for the given args.
///
/// `date_from` starts at midnight, `date_to` ends at `23:59:59`, and `date`
/// covers one whole day. Missing bounds fall back to one month ago and now.
pub fn search_interval(args: &SearchArgs, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let mut from = parse_day(&args.date_from).and_then(start_of_day);
    let mut to = parse_day(&args.date_to).and_then(end_of_day);

    if let Some(day) = parse_day(&args.date) {
        from = start_of_day(day);
        to = end_of_day(day);
    }

    let from = from.unwrap_or_else(|| now.checked_sub_months(Months::new(1)).unwrap_or(now));
    let to = to.unwrap_or(now);
    (from, to)
}

/// IANA name of the local time zone, sent alongside the local timestamps.
pub fn local_time_zone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

fn parse_day(value: &Option<String>) -> Option<NaiveDate> {
    let value = value.as_deref()?.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn start_of_day(day: NaiveDate) -> Option<NaiveDateTime> {
    day.and_hms_opt(0, 0, 0)
}

fn end_of_day(day: NaiveDate) -> Option<NaiveDateTime> {
    day.and_hms_opt(23, 59, 59)
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|day| day.and_hms_opt(10, 30, 0))
            .unwrap()
    }

    fn fmt(value: NaiveDateTime) -> String {
        value.format(REMOTE_TIME_FORMAT).to_string()
    }

    #[test]
    fn empty_dates_default_to_last_month() {
        let args = SearchArgs {
            date: Some(String::new()),
            date_from: Some("  ".to_string()),
            ..SearchArgs::default()
        };
        let (from, to) = search_interval(&args, now());
        assert_eq!(fmt(from), "2024-02-15T10:30:00");
        assert_eq!(fmt(to), "2024-03-15T10:30:00");
    }

    #[test]
    fn single_date_covers_whole_day() {
        let args = SearchArgs {
            date: Some("2024-01-07".to_string()),
            date_from: Some("2023-12-01".to_string()),
            date_to: Some("2023-12-31".to_string()),
            ..SearchArgs::default()
        };
        let (from, to) = search_interval(&args, now());
        assert_eq!(fmt(from), "2024-01-07T00:00:00");
        assert_eq!(fmt(to), "2024-01-07T23:59:59");
    }

    #[test]
    fn open_ended_ranges_fill_missing_bound() {
        let from_only = SearchArgs {
            date_from: Some("2024-03-01".to_string()),
            ..SearchArgs::default()
        };
        let (from, to) = search_interval(&from_only, now());
        assert_eq!(fmt(from), "2024-03-01T00:00:00");
        assert_eq!(to, now());

        let to_only = SearchArgs {
            date_to: Some("2024-03-10".to_string()),
            ..SearchArgs::default()
        };
        let (from, to) = search_interval(&to_only, now());
        assert_eq!(fmt(from), "2024-02-15T10:30:00");
        assert_eq!(fmt(to), "2024-03-10T23:59:59");
    }

    #[test]
    fn unparseable_dates_are_ignored() {
        let args = SearchArgs {
            date: Some("yesterday".to_string()),
            ..SearchArgs::default()
        };
        let (from, to) = search_interval(&args, now());
        assert_eq!(fmt(from), "2024-02-15T10:30:00");
        assert_eq!(to, now());
    }

    #[test]
    fn month_arithmetic_clamps_to_shorter_month() {
        let end_of_march = NaiveDate::from_ymd_opt(2024, 3, 31)
            .and_then(|day| day.and_hms_opt(8, 0, 0))
            .unwrap();
        let (from, _) = search_interval(&SearchArgs::default(), end_of_march);
        assert_eq!(fmt(from), "2024-02-29T08:00:00");
    }

    #[test]
    fn remote_query_and_combines_filters_in_order() {
        let args = SearchArgs {
            search: Some(" login ".to_string()),
            object_id: Some(42),
            user_id: Some(7),
            user_role: Some("administrator".to_string()),
            connector: Some("posts".to_string()),
            context: Some(String::new()),
            action: Some("updated".to_string()),
            ..SearchArgs::default()
        };
        let query = SearchQuery::from_args(&args, "https://blog.example.com", now());

        assert_eq!(
            query.remote_query("_sourceCategory=stream"),
            "_sourceCategory=stream AND site=\"https://blog.example.com\" AND \"login\" \
             AND object_id=\"42\" AND user_id=\"7\" AND user_role=\"administrator\" \
             AND connector=\"posts\" AND action=\"updated\""
        );
    }

    #[test]
    fn remote_query_without_base_starts_with_first_filter() {
        let query = SearchQuery::from_args(&SearchArgs::default(), "https://a.example", now());
        assert_eq!(query.remote_query(""), "site=\"https://a.example\"");
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        let args = SearchArgs {
            search: Some("say \"hi\"".to_string()),
            ..SearchArgs::default()
        };
        let query = SearchQuery::from_args(&args, "", now());
        assert_eq!(query.remote_query("base"), "base AND \"say \\\"hi\\\"\"");
    }

    #[test]
    fn submit_body_uses_remote_field_names() {
        let args = SearchArgs {
            date: Some("2024-01-07".to_string()),
            ..SearchArgs::default()
        };
        let query = SearchQuery::from_args(&args, "", now());
        let body = serde_json::to_value(query.submit_body("q", "Europe/Stockholm")).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "query": "q",
                "from": "2024-01-07T00:00:00",
                "to": "2024-01-07T23:59:59",
                "timeZone": "Europe/Stockholm",
            })
        );
    }
}
