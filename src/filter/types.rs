use std::str::FromStr;

use crate::database::models::{CommentStatus, PostStatus};
use crate::filter::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    Popular,
    Relevance,
}

impl SortBy {
    pub const ALL: [&'static str; 4] = ["Newest", "Oldest", "Popular", "Relevance"];
}

impl FromStr for SortBy {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Newest" => Ok(SortBy::Newest),
            "Oldest" => Ok(SortBy::Oldest),
            "Popular" => Ok(SortBy::Popular),
            "Relevance" => Ok(SortBy::Relevance),
            _ => Err(FilterError::InvalidSort(s.to_string())),
        }
    }
}

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    TextArray(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

/// Accumulates bound parameters and hands back their placeholders.
#[derive(Debug, Default)]
pub(crate) struct Params {
    values: Vec<SqlParam>,
}

impl Params {
    pub fn push(&mut self, value: SqlParam) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    pub fn text(&mut self, value: impl Into<String>) -> String {
        self.push(SqlParam::Text(value.into()))
    }

    pub fn text_array(&mut self, values: Vec<String>) -> String {
        self.push(SqlParam::TextArray(values))
    }

    pub fn into_inner(self) -> Vec<SqlParam> {
        self.values
    }
}

/// Trimmed search text, or `None` when nothing searchable is left.
pub(crate) fn normalize_search(query: Option<String>) -> Option<String> {
    query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
}

/// Lowercased, de-duplicated, order-preserving tag list.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Username whose vote is attached to each row; empty for anonymous callers.
    pub viewer: String,
    pub id: Option<String>,
    pub author: Option<String>,
    pub statuses: Vec<PostStatus>,
    pub search: Option<String>,
    pub tags: Vec<String>,
    pub liked_by: Option<String>,
    pub sort_by: SortBy,
}

impl PostFilter {
    pub fn new(viewer: impl Into<String>) -> Self {
        Self {
            viewer: viewer.into(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn statuses(mut self, statuses: &[PostStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn search(mut self, query: Option<String>) -> Self {
        self.search = normalize_search(query);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn liked_by(mut self, username: impl Into<String>) -> Self {
        self.liked_by = Some(username.into());
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentFilter {
    pub viewer: String,
    pub id: Option<String>,
    pub post_id: Option<String>,
    pub author: Option<String>,
    pub statuses: Vec<CommentStatus>,
    pub search: Option<String>,
    pub liked_by: Option<String>,
    pub sort_by: SortBy,
}

impl CommentFilter {
    pub fn new(viewer: impl Into<String>) -> Self {
        Self {
            viewer: viewer.into(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn post_id(mut self, post_id: impl Into<String>) -> Self {
        self.post_id = Some(post_id.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn statuses(mut self, statuses: &[CommentStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn search(mut self, query: Option<String>) -> Self {
        self.search = normalize_search(query);
        self
    }

    pub fn liked_by(mut self, username: impl Into<String>) -> Self {
        self.liked_by = Some(username.into());
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_parses_exact_names() {
        assert_eq!("Newest".parse::<SortBy>().unwrap(), SortBy::Newest);
        assert_eq!("Popular".parse::<SortBy>().unwrap(), SortBy::Popular);
        assert_eq!("Relevance".parse::<SortBy>().unwrap(), SortBy::Relevance);
        assert!(matches!("popular".parse::<SortBy>(), Err(FilterError::InvalidSort(_))));
        assert!(matches!("Hottest".parse::<SortBy>(), Err(FilterError::InvalidSort(_))));
        assert_eq!(SortBy::default(), SortBy::Newest);
    }

    #[test]
    fn test_tags_are_lowercased_and_deduplicated() {
        let filter = PostFilter::new("").tags(["Go", "go", " GO ", "rust", ""]);
        assert_eq!(filter.tags, vec!["go".to_string(), "rust".to_string()]);
    }

    #[test]
    fn test_blank_search_is_dropped() {
        assert_eq!(PostFilter::new("").search(Some("   ".into())).search, None);
        assert_eq!(
            PostFilter::new("").search(Some("  borrow checker ".into())).search,
            Some("borrow checker".to_string())
        );
    }

    #[test]
    fn test_params_number_placeholders_in_order() {
        let mut params = Params::default();
        assert_eq!(params.text("alice"), "$1");
        assert_eq!(params.text_array(vec!["a".into()]), "$2");
        assert_eq!(params.into_inner().len(), 2);
    }
}
