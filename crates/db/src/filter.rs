//! Backend-neutral filter expressions.
//!
//! A [`Filter`] is translated into a MongoDB query document by
//! [`Filter::to_document`] and evaluated directly against stored documents
//! by [`Filter::matches`], so both backends agree on what a query selects.

use mongodb::bson::{doc, Bson, Document};

/// Predicate over the documents of a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Exact, case-sensitive equality on a field.
    Eq { field: String, value: Bson },
    /// Case-insensitive substring match on a string field.
    Contains { field: String, needle: String },
    /// Case-insensitive substring match on any element of an array field.
    AnyContains { field: String, needle: String },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::Contains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn any_contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::AnyContains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    /// Conjunction of `filters`. `All` operands are dropped; a single
    /// remaining operand is returned as-is.
    pub fn and(filters: Vec<Filter>) -> Self {
        let mut filters: Vec<Filter> = filters
            .into_iter()
            .filter(|filter| *filter != Filter::All)
            .collect();

        match filters.len() {
            0 => Filter::All,
            1 => filters.remove(0),
            _ => Filter::And(filters),
        }
    }

    /// Disjunction of `filters`. An empty disjunction matches everything.
    pub fn or(mut filters: Vec<Filter>) -> Self {
        if filters.iter().any(|filter| *filter == Filter::All) {
            return Filter::All;
        }

        match filters.len() {
            0 => Filter::All,
            1 => filters.remove(0),
            _ => Filter::Or(filters),
        }
    }

    /// Translate into a MongoDB query document.
    pub fn to_document(&self) -> Document {
        match self {
            Filter::All => Document::new(),
            Filter::Eq { field, value } => {
                let mut query = Document::new();
                query.insert(field.as_str(), value.clone());
                query
            }
            Filter::Contains { field, needle } => {
                let mut query = Document::new();
                query.insert(field.as_str(), case_insensitive_regex(needle));
                query
            }
            Filter::AnyContains { field, needle } => {
                let mut query = Document::new();
                query.insert(
                    field.as_str(),
                    doc! { "$elemMatch": case_insensitive_regex(needle) },
                );
                query
            }
            Filter::And(filters) => doc! {
                "$and": filters.iter().map(Filter::to_document).collect::<Vec<_>>(),
            },
            Filter::Or(filters) => doc! {
                "$or": filters.iter().map(Filter::to_document).collect::<Vec<_>>(),
            },
        }
    }

    /// Evaluate against a stored document.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => document.get(field) == Some(value),
            Filter::Contains { field, needle } => match document.get(field) {
                Some(Bson::String(text)) => contains_ignore_case(text, needle),
                _ => false,
            },
            Filter::AnyContains { field, needle } => match document.get(field) {
                Some(Bson::Array(items)) => items.iter().any(|item| match item {
                    Bson::String(text) => contains_ignore_case(text, needle),
                    _ => false,
                }),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(document)),
            Filter::Or(filters) => filters.iter().any(|filter| filter.matches(document)),
        }
    }
}

/// The needle is matched literally, never as a pattern.
fn case_insensitive_regex(needle: &str) -> Document {
    doc! {
        "$regex": regex::escape(needle),
        "$options": "i",
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
