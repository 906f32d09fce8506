use serde::{Deserialize, Serialize};

/// Identifier assigned by the book store.
pub type BookId = bookshop_db::RowId;

/// A stored book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "book")]
pub struct Book {
    /// Unique identifier, never changes after creation
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// `None` means no price was given, which is not the same as zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub currency: String,
}

impl Book {
    /// Build the record the store keeps for a freshly inserted input.
    pub fn from_input(id: BookId, input: BookInput) -> Self {
        Self {
            id,
            title: input.title,
            author: input.author,
            price: input.price,
            currency: input.currency,
        }
    }

    /// Full replace: every mutable field comes from `input`, empty or not.
    pub fn replaced_with(&self, input: &BookInput) -> Self {
        Self {
            id: self.id,
            title: input.title.clone(),
            author: input.author.clone(),
            price: input.price,
            currency: input.currency.clone(),
        }
    }

    /// Partial update: only fields the patch actually sets are taken over.
    pub fn merged_with(&self, patch: &BookPatch) -> Self {
        Self {
            id: self.id,
            title: non_empty(&patch.title).unwrap_or(&self.title).to_owned(),
            author: non_empty(&patch.author).unwrap_or(&self.author).to_owned(),
            price: patch.price.or(self.price),
            currency: non_empty(&patch.currency).unwrap_or(&self.currency).to_owned(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&String> {
    value.as_ref().filter(|v| !v.is_empty())
}

/// Body of create and full-update requests. Any incoming `id` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "book")]
pub struct BookInput {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub author: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub currency: String,
}

/// Body of partial-update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "book")]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Query string of the list operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub author: Option<String>,
    pub title: Option<String>,
}

impl BookFilter {
    /// Case-insensitive substring match on author AND title.
    /// Absent or empty criteria match everything.
    pub fn matches(&self, book: &Book) -> bool {
        contains_ignore_case(&book.author, self.author.as_deref())
            && contains_ignore_case(&book.title, self.title.as_deref())
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) if !needle.is_empty() => haystack
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        _ => true,
    }
}

/// XML rendering of a list: `<books><book>..</book></books>`.
#[derive(Debug, Serialize)]
#[serde(rename = "books")]
pub struct BookCollection {
    #[serde(rename = "book")]
    pub books: Vec<Book>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
