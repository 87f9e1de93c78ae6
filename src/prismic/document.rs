//! Raw documents as returned by the content source

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A content source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type", default)]
    pub doc_type: String,

    #[serde(default, with = "timestamp")]
    pub first_publication_date: Option<DateTime<FixedOffset>>,

    #[serde(default, with = "timestamp")]
    pub last_publication_date: Option<DateTime<FixedOffset>>,

    /// Custom type fields
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One page of query results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsPage {
    pub results: Vec<Document>,

    /// Cursor for the following page; absent on the last page
    #[serde(default)]
    pub next_page: Option<String>,
}

/// (De)serialization of the source's `2021-03-25T19:25:28+0000` timestamps
pub mod timestamp {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn parse(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        DateTime::parse_from_str(value, FORMAT).or_else(|_| DateTime::parse_from_rfc3339(value))
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_some(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
