//! Post models

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use super::{ReadingTime, RichTextBlock};
use crate::prismic::{ContentError, ContentResult, Document};

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,

    /// Slug used in post URLs
    pub uid: Option<String>,

    pub first_publication_date: Option<DateTime<FixedOffset>>,

    pub title: String,

    pub subtitle: String,

    pub author: String,
}

/// A section of a post body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<RichTextBlock>,
}

/// A full post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: String,

    pub uid: Option<String>,

    pub first_publication_date: Option<DateTime<FixedOffset>>,

    pub title: String,

    pub subtitle: String,

    pub banner_url: String,

    pub author: String,

    pub content: Vec<ContentSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SummaryFields {
    #[serde(deserialize_with = "null_as_default")]
    title: String,
    #[serde(deserialize_with = "null_as_default")]
    subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    author: String,
}

#[derive(Debug, Default, Deserialize)]
struct Banner {
    #[serde(default, deserialize_with = "null_as_default")]
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailFields {
    #[serde(deserialize_with = "null_as_default")]
    title: String,
    #[serde(deserialize_with = "null_as_default")]
    subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    banner: Banner,
    #[serde(deserialize_with = "null_as_default")]
    author: String,
    #[serde(deserialize_with = "null_as_default")]
    content: Vec<ContentSection>,
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn fields<T>(doc: &Document) -> ContentResult<T>
where
    T: Default + serde::de::DeserializeOwned,
{
    match &doc.data {
        serde_json::Value::Null => Ok(T::default()),
        serde_json::Value::Object(_) => {
            serde_json::from_value(doc.data.clone()).map_err(|e| ContentError::InvalidDocument {
                id: doc.id.clone(),
                reason: e.to_string(),
            })
        }
        _ => Err(ContentError::InvalidDocument {
            id: doc.id.clone(),
            reason: "data is not an object".to_string(),
        }),
    }
}

impl PostSummary {
    pub fn from_document(doc: Document) -> ContentResult<Self> {
        let data: SummaryFields = fields(&doc)?;
        Ok(Self {
            id: doc.id,
            uid: doc.uid,
            first_publication_date: doc.first_publication_date,
            title: data.title,
            subtitle: data.subtitle,
            author: data.author,
        })
    }

    /// Slug for the post URL, the document id when no uid is set
    pub fn slug(&self) -> &str {
        self.uid.as_deref().unwrap_or(&self.id)
    }
}

impl PostDetail {
    pub fn from_document(doc: Document) -> ContentResult<Self> {
        let data: DetailFields = fields(&doc)?;
        Ok(Self {
            id: doc.id,
            uid: doc.uid,
            first_publication_date: doc.first_publication_date,
            title: data.title,
            subtitle: data.subtitle,
            banner_url: data.banner.url,
            author: data.author,
            content: data.content,
        })
    }

    pub fn slug(&self) -> &str {
        self.uid.as_deref().unwrap_or(&self.id)
    }

    pub fn reading_time(&self, words_per_minute: usize) -> ReadingTime {
        ReadingTime::estimate(&self.content, words_per_minute)
    }
}
