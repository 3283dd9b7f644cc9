//! Image download through the client pool

use crate::integration::mock_server::MockServerFixture;
use mockito::Matcher;
use pixeldojo::ErrorKind;

#[tokio::test]
async fn test_download_writes_file_and_creates_parents() {
    let mut fixture = MockServerFixture::new().await;
    let png = vec![0x89u8, b'P', b'N', b'G', 0, 1, 2, 3];
    let mock = fixture
        .server
        .mock("GET", "/images/1.png")
        // No API credentials leak to image hosts.
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(&png)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nested").join("deeper").join("out.png");
    let client = fixture.client(0);
    let bytes = client
        .download_image(&format!("{}/images/1.png", fixture.base_url), Some(&dest))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(bytes.as_ref(), png.as_slice());
    assert_eq!(std::fs::read(&dest).unwrap(), png);
}

#[tokio::test]
async fn test_download_without_destination_returns_bytes() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .server
        .mock("GET", "/a.png")
        .with_status(200)
        .with_body("abc")
        .create_async()
        .await;

    let client = fixture.client(0);
    let bytes = client
        .download_image(&format!("{}/a.png", fixture.base_url), None)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"abc");
}

#[tokio::test]
async fn test_download_non_success_status_fails() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", "/missing.png")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing.png");
    let client = fixture.client(3);
    let err = client
        .download_image(&format!("{}/missing.png", fixture.base_url), Some(&dest))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(err.status_code(), Some(404));
    assert!(!dest.exists());
}
