use crate::filter::types::{CommentFilter, Params, SortBy, SqlResult};

const COMMENT_BASE: &str = "SELECT c.id, c.body, c.author, c.post_id, c.status, \
c.parent_id, c.parent_author, c.parent_body, \
COALESCE(v.likes, 0) AS likes, \
COALESCE(v.dislikes, 0) AS dislikes, \
c.created_at, c.updated_at, \
my_vote.vote AS user_vote \
FROM comment c \
LEFT JOIN (SELECT comment_id, \
COUNT(*) FILTER (WHERE vote = 'Like') AS likes, \
COUNT(*) FILTER (WHERE vote = 'Dislike') AS dislikes, \
ARRAY_AGG(viewer) FILTER (WHERE vote = 'Like') AS liked_by \
FROM comment_vote GROUP BY comment_id) v ON v.comment_id = c.id \
LEFT JOIN comment_vote my_vote ON my_vote.comment_id = c.id AND my_vote.viewer = $1 \
WHERE 1 = 1";

/// Compile a comment filter into one parameterized SELECT.
pub fn comment_select(filter: &CommentFilter) -> SqlResult {
    let mut params = Params::default();
    let mut query = String::from(COMMENT_BASE);

    params.text(filter.viewer.clone());

    if let Some(id) = &filter.id {
        query.push_str(&format!(" AND c.id = {}", params.text(id.clone())));
    }
    if let Some(post_id) = &filter.post_id {
        query.push_str(&format!(" AND c.post_id = {}", params.text(post_id.clone())));
    }
    if let Some(author) = &filter.author {
        query.push_str(&format!(" AND c.author = {}", params.text(author.clone())));
    }
    if !filter.statuses.is_empty() {
        let statuses = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();
        query.push_str(&format!(" AND c.status = ANY({})", params.text_array(statuses)));
    }

    let search = filter.search.as_ref().map(|q| params.text(q.clone()));
    if let Some(placeholder) = &search {
        query.push_str(&format!(
            " AND c.textsearchable_index @@ plainto_tsquery('english', {})",
            placeholder
        ));
    }

    if let Some(liked_by) = &filter.liked_by {
        query.push_str(&format!(" AND {} = ANY(v.liked_by)", params.text(liked_by.clone())));
    }

    let order = match (filter.sort_by, &search) {
        (SortBy::Oldest, _) => " ORDER BY c.created_at ASC".to_string(),
        (SortBy::Popular, _) => {
            " ORDER BY (COALESCE(v.likes, 0) - COALESCE(v.dislikes, 0)) DESC, c.created_at DESC".to_string()
        }
        (SortBy::Relevance, Some(search)) => format!(
            " ORDER BY ts_rank_cd(c.textsearchable_index, plainto_tsquery('english', {})) DESC, c.created_at DESC",
            search
        ),
        _ => " ORDER BY c.created_at DESC".to_string(),
    };
    query.push_str(&order);

    SqlResult {
        query,
        params: params.into_inner(),
    }
}
