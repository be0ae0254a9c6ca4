//! Field values and their display formatting.
//!
//! Form inputs arrive as text, counts, money amounts and dates. They are
//! turned into display strings here, before they reach the substitution
//! engine, so the engine only ever sees a [`PlaceholderMap`] of strings.

use crate::error::{Error, Result};
use crate::fill::{Delimiters, PlaceholderMap};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// A typed form value.
///
/// In JSON, a bare string is `Text`, a non-negative integer is `Count`,
/// `{"amount": 10000}` is an `Amount` and `{"date": "2025-03-01"}` is a
/// `Date` (optionally with `"style"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text, used verbatim
    Text(String),

    /// A plain count, rendered without separators
    Count(u64),

    /// A money amount, rendered with thousands separators
    Amount {
        /// Whole units
        amount: i64,
    },

    /// A calendar date
    Date {
        /// The date
        date: NaiveDate,
        /// How to print it
        #[serde(default)]
        style: DateStyle,
    },
}

impl FieldValue {
    /// Create a text value.
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Create an amount value.
    pub fn amount(amount: i64) -> Self {
        FieldValue::Amount { amount }
    }

    /// Create a date value.
    pub fn date(date: NaiveDate, style: DateStyle) -> Self {
        FieldValue::Date { date, style }
    }

    /// Render the value as it should appear in the document.
    pub fn display(&self) -> Result<String> {
        match self {
            FieldValue::Text(s) => Ok(s.clone()),
            FieldValue::Count(n) => Ok(n.to_string()),
            FieldValue::Amount { amount } => Ok(group_thousands(*amount)),
            FieldValue::Date { date, style } => style.format(*date),
        }
    }

    /// Numeric value used when summing totals.
    ///
    /// Text counts if it parses as an integer once `,` separators are
    /// removed.
    pub fn numeric(&self) -> Option<i64> {
        match self {
            FieldValue::Count(n) => i64::try_from(*n).ok(),
            FieldValue::Amount { amount } => Some(*amount),
            FieldValue::Text(s) => s.trim().replace(',', "").parse().ok(),
            FieldValue::Date { .. } => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Count(value)
    }
}

/// Date rendering styles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `01 March, 2025`
    #[default]
    Long,
    /// `01-03-2025`
    Numeric,
    /// `01 Mar 2025`
    Short,
    /// Any chrono `strftime` pattern
    Custom(String),
}

impl DateStyle {
    /// The `strftime` pattern for this style.
    pub fn pattern(&self) -> &str {
        match self {
            DateStyle::Long => "%d %B, %Y",
            DateStyle::Numeric => "%d-%m-%Y",
            DateStyle::Short => "%d %b %Y",
            DateStyle::Custom(p) => p,
        }
    }

    /// Format a date, failing on an invalid custom pattern.
    pub fn format(&self, date: NaiveDate) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", date.format(self.pattern()))
            .map_err(|_| Error::InvalidValue(format!("bad date pattern '{}'", self.pattern())))?;
        Ok(out)
    }
}

/// Format an integer with `,` between groups of three digits.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// The values collected for one generation request.
///
/// `totals` names derived amounts: each is the sum of the listed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    /// Field name → value
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,

    /// Derived field name → names of the fields it sums
    #[serde(default)]
    pub totals: BTreeMap<String, Vec<String>>,
}

impl FieldSet {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a field set from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set a field and return self.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Declare a derived total.
    pub fn add_total<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        sources: impl IntoIterator<Item = S>,
    ) {
        self.totals
            .insert(name.into(), sources.into_iter().map(Into::into).collect());
    }

    /// Merge another set into this one; its entries win.
    pub fn merge(&mut self, other: FieldSet) {
        self.fields.extend(other.fields);
        self.totals.extend(other.totals);
    }

    /// Compute a declared total. Missing or non-numeric sources count as zero.
    pub fn total(&self, name: &str) -> Result<Option<i64>> {
        let Some(sources) = self.totals.get(name) else {
            return Ok(None);
        };
        let mut sum: i64 = 0;
        for source in sources {
            let value = match self.fields.get(source) {
                Some(v) => v.numeric().unwrap_or_else(|| {
                    log::warn!("Field '{}' is not numeric; counted as 0 in '{}'", source, name);
                    0
                }),
                None => 0,
            };
            sum = sum
                .checked_add(value)
                .ok_or_else(|| Error::InvalidValue(format!("total '{}' overflows", name)))?;
        }
        Ok(Some(sum))
    }

    /// Render every field and total into a placeholder map.
    ///
    /// Totals override a plain field of the same name.
    pub fn to_placeholders(&self, delimiters: &Delimiters) -> Result<PlaceholderMap> {
        let mut map = PlaceholderMap::new();
        for (name, value) in &self.fields {
            map.insert(delimiters.wrap(name), value.display()?);
        }
        for name in self.totals.keys() {
            if let Some(sum) = self.total(name)? {
                map.insert(delimiters.wrap(name), group_thousands(sum));
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(10000), "10,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-1234567), "-1,234,567");
        assert_eq!(group_thousands(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn test_date_styles() {
        let d = date(2025, 3, 1);
        assert_eq!(DateStyle::Long.format(d).unwrap(), "01 March, 2025");
        assert_eq!(DateStyle::Numeric.format(d).unwrap(), "01-03-2025");
        assert_eq!(DateStyle::Short.format(d).unwrap(), "01 Mar 2025");
        assert_eq!(
            DateStyle::Custom("%Y/%m/%d".to_string()).format(d).unwrap(),
            "2025/03/01"
        );
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let result = DateStyle::Custom("%Q".to_string()).format(date(2025, 3, 1));
        assert!(matches!(result, Err(Error::InvalidValue(_))));
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::text("Sales").display().unwrap(), "Sales");
        assert_eq!(FieldValue::Count(3).display().unwrap(), "3");
        assert_eq!(FieldValue::amount(10000).display().unwrap(), "10,000");
    }

    #[test]
    fn test_field_value_json() {
        let set = FieldSet::from_json(
            r#"{
                "fields": {
                    "E-Name": "Priya Shah",
                    "Months": 6,
                    "Stipend": {"amount": 15000},
                    "S-Date": {"date": "2025-03-01"},
                    "S-date": {"date": "2025-03-01", "style": "numeric"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(set.fields["E-Name"], FieldValue::text("Priya Shah"));
        assert_eq!(set.fields["Months"], FieldValue::Count(6));
        assert_eq!(set.fields["Stipend"], FieldValue::amount(15000));
        assert_eq!(
            set.fields["S-date"],
            FieldValue::date(date(2025, 3, 1), DateStyle::Numeric)
        );

        let map = set.to_placeholders(&Delimiters::default()).unwrap();
        assert_eq!(map.get("<<Stipend>>"), Some("15,000"));
        assert_eq!(map.get("<<S-Date>>"), Some("01 March, 2025"));
        assert_eq!(map.get("<<S-date>>"), Some("01-03-2025"));
        assert_eq!(map.get("<<Months>>"), Some("6"));
    }

    #[test]
    fn test_numeric() {
        assert_eq!(FieldValue::text("1,500").numeric(), Some(1500));
        assert_eq!(FieldValue::text("n/a").numeric(), None);
        assert_eq!(FieldValue::Count(4).numeric(), Some(4));
        assert_eq!(FieldValue::date(date(2025, 1, 1), DateStyle::Long).numeric(), None);
    }

    #[test]
    fn test_totals() {
        let mut set = FieldSet::new()
            .with("P01", FieldValue::amount(1200))
            .with("P02", "3,300");
        set.add_total("T-Price", ["P01", "P02", "P03"]);

        assert_eq!(set.total("T-Price").unwrap(), Some(4500));
        assert_eq!(set.total("Unknown").unwrap(), None);

        let map = set.to_placeholders(&Delimiters::default()).unwrap();
        assert_eq!(map.get("<<T-Price>>"), Some("4,500"));
        assert_eq!(map.get("<<P02>>"), Some("3,300"));
    }

    #[test]
    fn test_total_overflow() {
        let mut set = FieldSet::new()
            .with("a", FieldValue::amount(i64::MAX))
            .with("b", FieldValue::amount(1));
        set.add_total("sum", ["a", "b"]);
        assert!(matches!(set.total("sum"), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn test_merge() {
        let mut base = FieldSet::new().with("Country", "India");
        base.add_total("T-Price", ["P01"]);
        let other = FieldSet::new().with("Country", "USA");
        base.merge(other);
        assert_eq!(base.fields["Country"], FieldValue::text("USA"));
        assert!(base.totals.contains_key("T-Price"));
    }
}
