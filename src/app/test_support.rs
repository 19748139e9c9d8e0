//! Shared fixtures for unit tests

use serde_json::{json, Value};

use crate::app::client::SnapshotClient;
use crate::app::models::Article;

/// A published article row in the shape the REST layer returns
pub fn article_row(id: &str, category: &str, published_at: &str) -> Value {
    json!({
        "id": id,
        "slug": format!("story-{}", id),
        "title": format!("Story {}", id),
        "subtitle": null,
        "excerpt": format!("Excerpt for {}", id),
        "content": {"type": "doc", "content": []},
        "cover_image": format!("https://cdn.test/{}.jpg", id),
        "status": "published",
        "featured": false,
        "author_name": "Desk",
        "published_at": published_at,
        "created_at": "2023-12-01T00:00:00Z",
        "category": {
            "id": format!("cat-{}", category),
            "name": category,
            "slug": category,
            "color": "#FF1001",
            "description": null
        }
    })
}

/// Six published articles over three categories plus one uncategorized and
/// one draft. `a6` is the newest.
pub fn sample_rows() -> Vec<Value> {
    let mut rows = vec![
        article_row("a1", "culture", "2024-01-01T08:00:00Z"),
        article_row("a2", "film", "2024-01-02T08:00:00Z"),
        article_row("a3", "culture", "2024-01-03T08:00:00Z"),
        article_row("a4", "news", "2024-01-04T08:00:00Z"),
        article_row("a5", "film", "2024-01-05T08:00:00Z"),
        article_row("a6", "culture", "2024-01-06T08:00:00Z"),
    ];

    let mut uncategorized = article_row("u1", "news", "2024-01-03T12:00:00Z");
    uncategorized["category"] = Value::Null;
    rows.push(uncategorized);

    let mut draft = article_row("draft", "culture", "2024-01-07T08:00:00Z");
    draft["status"] = json!("draft");
    rows.push(draft);

    rows
}

pub fn sample_client() -> SnapshotClient {
    SnapshotClient::new().with_articles(sample_rows())
}

pub fn ids_of(articles: &[Article]) -> Vec<&str> {
    articles.iter().map(|a| a.id.as_str()).collect()
}
