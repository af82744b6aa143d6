use crate::filter::types::{Params, PostFilter, SortBy, SqlParam, SqlResult};

const POST_BASE: &str = "SELECT p.id, p.title, p.body, p.author, p.status, p.created_at, p.updated_at, \
COALESCE(t.tags, ARRAY[]::TEXT[]) AS tags, \
COALESCE(v.likes, 0) AS likes, \
COALESCE(v.dislikes, 0) AS dislikes, \
my_vote.vote AS user_vote \
FROM post p \
LEFT JOIN (SELECT post_id, ARRAY_AGG(tag ORDER BY tag) AS tags FROM post_tag GROUP BY post_id) t ON t.post_id = p.id \
LEFT JOIN (SELECT post_id, \
COUNT(*) FILTER (WHERE vote = 'Like') AS likes, \
COUNT(*) FILTER (WHERE vote = 'Dislike') AS dislikes, \
ARRAY_AGG(viewer) FILTER (WHERE vote = 'Like') AS liked_by \
FROM post_vote GROUP BY post_id) v ON v.post_id = p.id \
LEFT JOIN post_vote my_vote ON my_vote.post_id = p.id AND my_vote.viewer = $1 \
WHERE 1 = 1";

/// Lowercased copy of the stored tag set, for case-insensitive comparison.
const LOWER_TAGS: &str = "ARRAY(SELECT LOWER(x) FROM UNNEST(t.tags) AS x)";

/// Compile a post filter into one parameterized SELECT.
pub fn post_select(filter: &PostFilter) -> SqlResult {
    let mut params = Params::default();
    let mut query = String::from(POST_BASE);

    params.text(filter.viewer.clone());

    if let Some(id) = &filter.id {
        query.push_str(&format!(" AND p.id = {}", params.text(id.clone())));
    }
    if let Some(author) = &filter.author {
        query.push_str(&format!(" AND p.author = {}", params.text(author.clone())));
    }
    if !filter.statuses.is_empty() {
        let statuses = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();
        query.push_str(&format!(" AND p.status = ANY({})", params.text_array(statuses)));
    }

    let search = filter.search.as_ref().map(|q| params.text(q.clone()));
    if let Some(placeholder) = &search {
        query.push_str(&format!(
            " AND p.textsearchable_index @@ plainto_tsquery('english', {})",
            placeholder
        ));
    }

    let tags = if filter.tags.is_empty() {
        None
    } else {
        Some(params.push(SqlParam::TextArray(filter.tags.clone())))
    };
    if let Some(placeholder) = &tags {
        query.push_str(&format!(" AND {} && {}::TEXT[]", LOWER_TAGS, placeholder));
    }

    if let Some(liked_by) = &filter.liked_by {
        query.push_str(&format!(" AND {} = ANY(v.liked_by)", params.text(liked_by.clone())));
    }

    query.push_str(&order_clause(filter.sort_by, search.as_deref(), tags.as_deref()));

    SqlResult {
        query,
        params: params.into_inner(),
    }
}

fn order_clause(sort_by: SortBy, search: Option<&str>, tags: Option<&str>) -> String {
    match (sort_by, search, tags) {
        (SortBy::Oldest, _, _) => " ORDER BY p.created_at ASC".to_string(),
        (SortBy::Popular, _, _) => {
            " ORDER BY (COALESCE(v.likes, 0) - COALESCE(v.dislikes, 0)) DESC, p.created_at DESC".to_string()
        }
        (SortBy::Relevance, Some(search), _) => format!(
            " ORDER BY ts_rank_cd(p.textsearchable_index, plainto_tsquery('english', {})) DESC, p.created_at DESC",
            search
        ),
        (SortBy::Relevance, None, Some(tags)) => format!(
            " ORDER BY CARDINALITY(ARRAY(SELECT LOWER(x) FROM UNNEST(t.tags) AS x INTERSECT SELECT y FROM UNNEST({}::TEXT[]) AS y)) DESC, p.created_at DESC",
            tags
        ),
        _ => " ORDER BY p.created_at DESC".to_string(),
    }
}
