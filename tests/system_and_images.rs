//! Backend settings, image transfer and the session-expiry rule

mod common;

use std::io::Write;

use blogctl::types::SystemConfig;
use blogctl::ClientError;
use common::{Harness, TOKEN};

#[tokio::test]
async fn test_get_config_wire_names() {
    let harness = Harness::start().await;
    let config = harness.client.system().get_config().await.unwrap();

    assert_eq!(config.blog_storage_path, "/srv/blog");
    assert_eq!(config.xmodel_api_key, "xk-1");
    assert_eq!(config.bigmodel_api_key, "");
}

#[tokio::test]
async fn test_update_config_requires_token() {
    let harness = Harness::start().await;
    let before = harness.hits().len();

    let err = harness
        .client
        .system()
        .update_config(&SystemConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NotAuthenticated));
    assert_eq!(harness.hits().len(), before, "no request may be sent");
}

#[tokio::test]
async fn test_update_config_round_trip() {
    let harness = Harness::start().await;
    harness.log_in_as(TOKEN);
    let system = harness.client.system();

    let mut config = system.get_config().await.unwrap();
    config.set_field("bigmodelAPIKey", "bk-9").unwrap();
    assert!(system.update_config(&config).await.unwrap());

    let hit = harness.last_hit();
    assert_eq!(hit.path, "/config/set");
    let sent: serde_json::Value = serde_json::from_slice(&hit.body).unwrap();
    assert_eq!(sent["bigmodelAPIKey"], "bk-9");
    assert_eq!(sent["blogStoragePath"], "/srv/blog");

    assert_eq!(system.get_config().await.unwrap().bigmodel_api_key, "bk-9");
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let harness = Harness::start().await;
    harness.log_in_as("expired");
    assert!(harness.session().is_authenticated());

    let err = harness
        .client
        .system()
        .update_config(&SystemConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized));
    assert!(!harness.session().is_authenticated());
    assert!(harness.session().get_user().is_none());
}

#[tokio::test]
async fn test_unauthorized_on_public_endpoint_also_clears() {
    let harness = Harness::start().await;
    harness.log_in_as("expired");

    let err = harness.client.blogs().list_blogs().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert!(harness.session().get_token().is_none());
}

#[tokio::test]
async fn test_upload_image_multipart() {
    let harness = Harness::start().await;
    harness.log_in_as(TOKEN);

    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(b"\x89PNG fake").unwrap();

    let result = harness
        .client
        .images()
        .upload_image(file.path(), "2024")
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.path.as_deref(), Some("2024/cat.png"));
    assert_eq!(result.image_id, Some(5));

    let hit = harness.last_hit();
    assert_eq!(hit.path, "/image/upload");
    assert!(hit
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data"));
    let body = hit.body_text();
    assert!(body.contains("name=\"relativePath\""));
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("image/png"));
    assert_eq!(hit.authorization.as_deref(), Some("Bearer tok-123"));
}

#[tokio::test]
async fn test_upload_failure_is_reported_not_raised() {
    let harness = Harness::start().await;

    let result = harness
        .client
        .images()
        .upload_bytes(b"data".to_vec(), "x.jpg", "reject-me")
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.message, "disk full");
}

#[tokio::test]
async fn test_upload_missing_local_file_is_io_error() {
    let harness = Harness::start().await;
    let err = harness
        .client
        .images()
        .upload_image(std::path::Path::new("/no/such/file.png"), "")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
}

#[tokio::test]
async fn test_get_image() {
    let harness = Harness::start().await;
    let images = harness.client.images();

    let bytes = images.get_image("2024/cat.png").await.unwrap().unwrap();
    assert_eq!(&bytes[..], &[0x89, b'P', b'N', b'G']);
    assert_eq!(harness.last_hit().path, "/image/2024/cat.png");

    assert!(images.get_image("/2024/dog.png").await.unwrap().is_none());
    assert_eq!(harness.last_hit().path, "/image/2024/dog.png");
}
