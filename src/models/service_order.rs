use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use strum::{AsRefStr, EnumIter, EnumString};

use crate::error::{AppError, Result, msg};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceOrderStatus {
    #[default]
    InProgress,
    Blocked,
    Finished,
    ReadyForDev,
    Canceled,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ServiceOrderTag {
    Seo,
    Design,
    Config,
    #[default]
    Feature,
}

/// Non-negative amount with two decimal places, stored as integer cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(i64);

impl Price {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Parse a form price. Accepts `,` as the decimal separator; blank means zero.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().replacen(',', ".", 1);
        if normalized.is_empty() {
            return Ok(Self(0));
        }

        if let Some(rest) = normalized.strip_prefix('-') {
            return match parse_cents(rest)? {
                0 => Ok(Self(0)),
                _ => Err(AppError::BadRequest(msg::NEGATIVE_PRICE.into())),
            };
        }

        let unsigned = normalized.strip_prefix('+').unwrap_or(&normalized);
        parse_cents(unsigned).map(Self)
    }
}

fn parse_cents(s: &str) -> Result<i64> {
    let invalid = || AppError::BadRequest(msg::INVALID_PRICE.into());

    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac_part.len() > 2 {
        return Err(AppError::BadRequest(msg::PRICE_TOO_PRECISE.into()));
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| invalid())?
    };
    let fraction: i64 = format!("{:0<2}", frac_part).parse().map_err(|_| invalid())?;

    whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or_else(invalid)
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceOrder {
    pub id: String,
    pub name: String,
    pub price: Price,
    pub description: Option<String>,
    pub status: ServiceOrderStatus,
    pub tag: ServiceOrderTag,
    pub delivery_date: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Form body for service order create/update.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceOrderForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<String>,
}

/// Validated service order fields ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOrderInput {
    pub name: String,
    pub price: Price,
    pub description: Option<String>,
    pub status: ServiceOrderStatus,
    pub tag: ServiceOrderTag,
    pub delivery_date: Option<NaiveDate>,
}

impl ServiceOrderForm {
    pub fn validate(&self) -> Result<ServiceOrderInput> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest(msg::NAME_REQUIRED.into()));
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);

        Ok(ServiceOrderInput {
            name: name.to_string(),
            price: Price::parse(self.price.as_deref().unwrap_or(""))?,
            description,
            status: parse_status(self.status.as_deref())?,
            tag: parse_tag(self.tag.as_deref())?,
            delivery_date: parse_delivery_date(self.delivery_date.as_deref())?,
        })
    }
}

/// Form body for the status-only update.
#[derive(Debug, Default, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: Option<String>,
}

impl StatusForm {
    pub fn validate(&self) -> Result<ServiceOrderStatus> {
        parse_status(self.status.as_deref())
    }
}

/// Blank means `in_progress`.
pub fn parse_status(raw: Option<&str>) -> Result<ServiceOrderStatus> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ServiceOrderStatus::default()),
        Some(s) => s
            .parse()
            .map_err(|_| AppError::BadRequest(msg::INVALID_STATUS.into())),
    }
}

/// Blank means `FEATURE`.
pub fn parse_tag(raw: Option<&str>) -> Result<ServiceOrderTag> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ServiceOrderTag::default()),
        Some(s) => s
            .parse()
            .map_err(|_| AppError::BadRequest(msg::INVALID_TAG.into())),
    }
}

pub fn parse_delivery_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(msg::INVALID_DELIVERY_DATE.into())),
    }
}

/// Query parameters for the service order listing (status tabs).
#[derive(Debug, Default, Deserialize)]
pub struct ServiceOrderListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

impl ServiceOrderListQuery {
    /// `None` selects the "all" tab.
    pub fn status_filter(&self) -> Result<Option<ServiceOrderStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest(msg::INVALID_STATUS.into())),
        }
    }
}

/// Per-tab badge counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub all: i64,
    pub in_progress: i64,
    pub blocked: i64,
    pub finished: i64,
    pub ready_for_dev: i64,
    pub canceled: i64,
}

impl StatusCounts {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ServiceOrderStatus, i64)>) -> Self {
        let mut counts = Self::default();
        for (status, count) in pairs {
            *counts.slot(status) += count;
            counts.all += count;
        }
        counts
    }

    pub fn get(&self, status: ServiceOrderStatus) -> i64 {
        match status {
            ServiceOrderStatus::InProgress => self.in_progress,
            ServiceOrderStatus::Blocked => self.blocked,
            ServiceOrderStatus::Finished => self.finished,
            ServiceOrderStatus::ReadyForDev => self.ready_for_dev,
            ServiceOrderStatus::Canceled => self.canceled,
        }
    }

    fn slot(&mut self, status: ServiceOrderStatus) -> &mut i64 {
        match status {
            ServiceOrderStatus::InProgress => &mut self.in_progress,
            ServiceOrderStatus::Blocked => &mut self.blocked,
            ServiceOrderStatus::Finished => &mut self.finished,
            ServiceOrderStatus::ReadyForDev => &mut self.ready_for_dev,
            ServiceOrderStatus::Canceled => &mut self.canceled,
        }
    }
}

/// Listing response: the active tab's orders plus counts for every tab.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceOrderList {
    pub items: Vec<ServiceOrder>,
    pub counts: StatusCounts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_price_parsing() {
        assert_eq!(Price::parse("12.50").unwrap().cents(), 1250);
        assert_eq!(Price::parse("12,5").unwrap().cents(), 1250);
        assert_eq!(Price::parse(" 7 ").unwrap().cents(), 700);
        assert_eq!(Price::parse(".99").unwrap().cents(), 99);
        assert_eq!(Price::parse("").unwrap().cents(), 0);
        assert_eq!(Price::parse("-0").unwrap().cents(), 0);
    }

    #[test]
    fn test_price_rejects_bad_input() {
        assert!(matches!(Price::parse("abc"), Err(AppError::BadRequest(m)) if m == msg::INVALID_PRICE));
        assert!(matches!(Price::parse("-3"), Err(AppError::BadRequest(m)) if m == msg::NEGATIVE_PRICE));
        assert!(matches!(Price::parse("1.234"), Err(AppError::BadRequest(m)) if m == msg::PRICE_TOO_PRECISE));
        assert!(Price::parse(".").is_err());
        assert!(Price::parse("1e3").is_err());
        assert!(Price::parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_cents(1250).to_string(), "12.50");
        assert_eq!(Price::from_cents(5).to_string(), "0.05");
        assert_eq!(serde_json::to_string(&Price::from_cents(100)).unwrap(), "\"1.00\"");
    }

    #[test]
    fn test_status_and_tag_defaults() {
        assert_eq!(parse_status(None).unwrap(), ServiceOrderStatus::InProgress);
        assert_eq!(parse_status(Some("  ")).unwrap(), ServiceOrderStatus::InProgress);
        assert_eq!(parse_status(Some("ready_for_dev")).unwrap(), ServiceOrderStatus::ReadyForDev);
        assert!(parse_status(Some("done")).is_err());

        assert_eq!(parse_tag(None).unwrap(), ServiceOrderTag::Feature);
        assert_eq!(parse_tag(Some("SEO")).unwrap(), ServiceOrderTag::Seo);
        assert!(parse_tag(Some("seo")).is_err());
        assert_eq!(ServiceOrderTag::Design.as_ref(), "DESIGN");
    }

    #[test]
    fn test_form_validation() {
        let form = ServiceOrderForm {
            name: "  Landing page ".into(),
            price: Some("1500,00".into()),
            description: Some("   ".into()),
            status: None,
            tag: Some("DESIGN".into()),
            delivery_date: Some("2026-11-30".into()),
        };
        let input = form.validate().unwrap();
        assert_eq!(input.name, "Landing page");
        assert_eq!(input.price.cents(), 150_000);
        assert_eq!(input.description, None);
        assert_eq!(input.status, ServiceOrderStatus::InProgress);
        assert_eq!(input.tag, ServiceOrderTag::Design);
        assert_eq!(input.delivery_date, NaiveDate::from_ymd_opt(2026, 11, 30));

        let missing_name = ServiceOrderForm::default();
        assert!(matches!(missing_name.validate(), Err(AppError::BadRequest(m)) if m == msg::NAME_REQUIRED));

        let bad_date = ServiceOrderForm {
            name: "x".into(),
            delivery_date: Some("30/11/2026".into()),
            ..Default::default()
        };
        assert!(bad_date.validate().is_err());
    }

    #[test]
    fn test_status_counts() {
        let counts = StatusCounts::from_pairs([
            (ServiceOrderStatus::Blocked, 2),
            (ServiceOrderStatus::Finished, 3),
        ]);
        assert_eq!(counts.all, 5);
        assert_eq!(counts.get(ServiceOrderStatus::Blocked), 2);
        assert_eq!(counts.get(ServiceOrderStatus::Canceled), 0);
        assert_eq!(ServiceOrderStatus::iter().count(), 5);
    }

    #[test]
    fn test_list_query_filter() {
        let all = ServiceOrderListQuery { status: Some("all".into()) };
        assert_eq!(all.status_filter().unwrap(), None);
        let blocked = ServiceOrderListQuery { status: Some("blocked".into()) };
        assert_eq!(blocked.status_filter().unwrap(), Some(ServiceOrderStatus::Blocked));
        let bogus = ServiceOrderListQuery { status: Some("nope".into()) };
        assert!(bogus.status_filter().is_err());
    }
}
