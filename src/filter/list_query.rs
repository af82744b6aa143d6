use url::form_urlencoded;

/// Caller-controlled knobs on list endpoints: `?query=..&tag=a&tag=b&sortBy=..`.
///
/// `author`, `statuses` and `likedBy` are never read from the query string;
/// each endpoint fixes them itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub query: Option<String>,
    pub tags: Vec<String>,
    pub sort_by: Option<String>,
}

impl ListQuery {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut out = ListQuery::default();
        let Some(raw) = raw else {
            return out;
        };

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "query" => out.query = Some(value.into_owned()),
                "tag" => out.tags.push(value.into_owned()),
                "sortBy" => out.sort_by = Some(value.into_owned()),
                _ => {}
            }
        }
        out
    }
}
