//! Media bucket tests against a mock storage service

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newsdesk::app::{ClientConfig, RestClient, ServiceEndpoint, StorageClient};
use newsdesk::constants::service;
use newsdesk::errors::StorageError;

fn media(server: &MockServer) -> StorageClient {
    let endpoint = ServiceEndpoint::new(&server.uri(), "anon-key").unwrap();
    RestClient::new(endpoint, &ClientConfig::default())
        .unwrap()
        .storage(service::MEDIA_BUCKET)
}

#[tokio::test]
async fn test_list_drops_placeholder_and_resolves_urls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/list/media"))
        .and(body_partial_json(json!({
            "sortBy": {"column": "created_at", "order": "desc"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "1714000000000-newest.jpg", "created_at": "2024-04-25T00:00:00Z"},
            {"name": ".emptyFolderPlaceholder", "created_at": null},
            {"name": "1713000000000-older.png", "created_at": "2024-04-13T00:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let objects = media(&server).list().await.unwrap();
    let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["1714000000000-newest.jpg", "1713000000000-older.png"]);
    assert_eq!(
        objects[0].url,
        format!(
            "{}/storage/v1/object/public/media/1714000000000-newest.jpg",
            server.uri()
        )
    );
}

#[tokio::test]
async fn test_upload_file_uses_unique_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/media/\d+-[a-z0-9]{10}\.png$"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "media/x.png"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("Cover Photo.PNG");
    tokio::fs::write(&file, [0x89, b'P', b'N', b'G']).await.unwrap();

    let name = media(&server).upload_file(&file).await.unwrap();
    assert!(name.ends_with(".png"));
    assert!(!name.contains(' '));
}

#[tokio::test]
async fn test_upload_is_sent_once_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/media/cover.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = media(&server)
        .upload("cover.jpg", vec![0xFF, 0xD8], "image/jpeg")
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let result = media(&server)
        .upload_file(&dir.path().join("missing.jpg"))
        .await;
    assert!(matches!(result, Err(StorageError::Io { .. })));
}

#[tokio::test]
async fn test_remove_sends_prefixes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/media"))
        .and(body_json(json!({"prefixes": ["a.jpg", "b.png"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    media(&server)
        .remove(&["a.jpg".to_string(), "b.png".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_names_never_reach_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let storage = media(&server);
    let result = storage.remove(&["../secrets".to_string()]).await;
    assert!(matches!(result, Err(StorageError::InvalidName { .. })));
    assert!(storage.public_url("nested/name.jpg").is_err());
}
