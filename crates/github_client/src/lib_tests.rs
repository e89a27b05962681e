//! Unit tests for the github_client crate.

use super::*; // Import items from lib.rs
use serde_json::json;
use std::collections::HashSet;
use std::time::Instant;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate}; // For constructing mock bodies

// --- Test Constants ---
const TEST_OWNER: &str = "test-org";
const TEST_REPO: &str = "test-repo";
const TEST_TOKEN: &str = "test-token";

fn create_test_client(mock_server: &MockServer) -> GitHubClient {
    let settings = ClientSettings {
        api_url: mock_server.uri(),
        ..ClientSettings::default()
    };
    create_token_client(&SecretString::from(TEST_TOKEN.to_string()), &settings)
        .expect("Failed to create token client")
}

fn branch_path(branch: &str) -> String {
    format!("/repos/{TEST_OWNER}/{TEST_REPO}/branches/{branch}/protection")
}

fn github_error_body(message: &str) -> serde_json::Value {
    json!({
        "message": message,
        "documentation_url": "https://docs.github.com/rest/branches/branch-protection"
    })
}

#[tokio::test]
async fn test_branch_requires_review_when_reviews_section_present() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("main")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://api.github.com/repos/test-org/test-repo/branches/main/protection",
            "required_pull_request_reviews": {
                "dismiss_stale_reviews": false,
                "require_code_owner_reviews": false,
                "required_approving_review_count": 1
            },
            "enforce_admins": { "enabled": false }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let result = client
        .branch_requires_review(TEST_OWNER, TEST_REPO, "main")
        .await;

    if let Err(e) = &result {
        eprintln!("branch_requires_review error: {e:?}");
    }
    assert!(result.unwrap());
}

#[tokio::test]
async fn test_branch_does_not_require_review_without_reviews_section() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("develop")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://api.github.com/repos/test-org/test-repo/branches/develop/protection",
            "enforce_admins": { "enabled": true }
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let status = client
        .get_branch_protection(TEST_OWNER, TEST_REPO, "develop")
        .await
        .expect("Expected protection payload");

    assert!(status.is_protected());
    assert!(!status.requires_review());
}

#[tokio::test]
async fn test_unprotected_branch_is_reported_as_not_protected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("feature")))
        .respond_with(ResponseTemplate::new(404).set_body_json(github_error_body(
            "Branch not protected",
        )))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let status = client
        .get_branch_protection(TEST_OWNER, TEST_REPO, "feature")
        .await
        .expect("A missing protection must not be an error");
    assert_eq!(status, ProtectionStatus::NotProtected);

    let requires_review = client
        .branch_requires_review(TEST_OWNER, TEST_REPO, "feature")
        .await
        .expect("A missing protection must not be an error");
    assert!(!requires_review);
}

#[tokio::test]
async fn test_other_client_errors_are_reported_as_not_protected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("main")))
        .respond_with(ResponseTemplate::new(403).set_body_json(github_error_body(
            "Upgrade to GitHub Pro or make this repository public to enable this feature.",
        )))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let requires_review = client
        .branch_requires_review(TEST_OWNER, TEST_REPO, "main")
        .await
        .expect("4xx responses must not be errors");

    assert!(!requires_review);
}

#[tokio::test]
async fn test_unauthorized_read_is_an_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("main")))
        .respond_with(ResponseTemplate::new(401).set_body_json(github_error_body(
            "Bad credentials",
        )))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let result = client
        .branch_requires_review(TEST_OWNER, TEST_REPO, "main")
        .await;

    match result {
        Err(Error::AuthError(message)) => assert_eq!(message, "Bad credentials"),
        other => panic!("Expected AuthError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_on_read_propagates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("main")))
        .respond_with(ResponseTemplate::new(502).set_body_json(github_error_body(
            "Server Error",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let result = client
        .get_branch_protection(TEST_OWNER, TEST_REPO, "main")
        .await;

    match result {
        Err(Error::ApiError { status, .. }) => assert_eq!(status, 502),
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_object_protection_payload_is_invalid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("main")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "an", "object"])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let result = client
        .get_branch_protection(TEST_OWNER, TEST_REPO, "main")
        .await;

    assert!(matches!(result, Err(Error::InvalidResponse)));
}

#[tokio::test]
async fn test_protect_branch_sends_policy_as_body() {
    let mock_server = MockServer::start().await;
    let policy = BranchProtectionPolicy::default();

    Mock::given(method("PUT"))
        .and(path(branch_path("main")))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://api.github.com/repos/test-org/test-repo/branches/main/protection"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let result = client
        .protect_branch(TEST_OWNER, TEST_REPO, "main", &policy)
        .await;

    if let Err(e) = &result {
        eprintln!("protect_branch error: {e:?}");
    }
    assert!(result.is_ok());

    let requests = mock_server
        .received_requests()
        .await
        .expect("Request recording is enabled");
    assert_eq!(requests.len(), 1);

    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("PUT body must be JSON");
    let sections = body.as_object().expect("PUT body must be an object");
    assert_eq!(sections.len(), 4);
    assert_eq!(body, serde_json::to_value(&policy).unwrap());

    let accepts_json = requests[0]
        .headers
        .get_all("accept")
        .iter()
        .any(|v| v.to_str().map(|s| s.contains(DEFAULT_ACCEPT_HEADER)).unwrap_or(false));
    assert!(accepts_json);
}

#[tokio::test]
async fn test_protect_branch_waits_for_the_write_to_complete() {
    let mock_server = MockServer::start().await;
    let delay = Duration::from_millis(200);

    Mock::given(method("PUT"))
        .and(path(branch_path("main")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "url": "protection" }))
                .set_delay(delay),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let started = Instant::now();
    client
        .protect_branch(
            TEST_OWNER,
            TEST_REPO,
            "main",
            &BranchProtectionPolicy::default(),
        )
        .await
        .expect("Write should succeed");

    assert!(started.elapsed() >= delay);
}

#[tokio::test]
async fn test_protect_branch_reports_rejected_write() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(branch_path("main")))
        .respond_with(ResponseTemplate::new(422).set_body_json(github_error_body(
            "Validation Failed",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let result = client
        .protect_branch(
            TEST_OWNER,
            TEST_REPO,
            "main",
            &BranchProtectionPolicy::default(),
        )
        .await;

    match result {
        Err(Error::ApiError { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "Validation Failed");
        }
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("main")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "required_pull_request_reviews": {} }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server).with_request_timeout(Duration::from_millis(50));

    let result = client
        .get_branch_protection(TEST_OWNER, TEST_REPO, "main")
        .await;

    match result {
        Err(Error::Timeout(after)) => assert_eq!(after, Duration::from_millis(50)),
        other => panic!("Expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_writes_do_not_interfere() {
    let mock_server = MockServer::start().await;
    let branches: Vec<String> = (0..10).map(|i| format!("release-{i}")).collect();
    let policy = BranchProtectionPolicy::default();

    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "url": "protection" }))
                .set_delay(Duration::from_millis(20)),
        )
        .expect(branches.len() as u64)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let calls = branches
        .iter()
        .map(|branch| client.protect_branch(TEST_OWNER, TEST_REPO, branch, &policy));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));

    let requests = mock_server.received_requests().await.unwrap();
    let expected_body = serde_json::to_value(&policy).unwrap();

    let paths: HashSet<String> = requests.iter().map(|r| r.url.path().to_string()).collect();
    let expected_paths: HashSet<String> = branches.iter().map(|b| branch_path(b)).collect();
    assert_eq!(paths, expected_paths);

    for request in &requests {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body, expected_body);
    }
}

#[test]
fn test_create_token_client_rejects_empty_token() {
    let result = create_token_client(
        &SecretString::from("   ".to_string()),
        &ClientSettings::default(),
    );

    assert!(matches!(result, Err(Error::AuthError(_))));
}

#[test]
fn test_client_settings_default() {
    let settings = ClientSettings::default();

    assert_eq!(settings.api_url, DEFAULT_API_URL);
    assert_eq!(settings.accept, DEFAULT_ACCEPT_HEADER);
    assert_eq!(settings.request_timeout, DEFAULT_REQUEST_TIMEOUT);
}

#[test]
fn test_protection_path() {
    assert_eq!(
        protection_path("octo", "hello", "main").unwrap(),
        "/repos/octo/hello/branches/main/protection"
    );
}

#[test]
fn test_protection_path_encodes_branch_characters() {
    assert_eq!(
        protection_path("octo", "hello", "fix#12").unwrap(),
        "/repos/octo/hello/branches/fix%2312/protection"
    );
    assert_eq!(
        protection_path("octo", "hello", "release/1.0").unwrap(),
        "/repos/octo/hello/branches/release%2F1.0/protection"
    );
    assert_eq!(
        protection_path("octo", "hello", "50%-done?").unwrap(),
        "/repos/octo/hello/branches/50%25-done%3F/protection"
    );
}

#[tokio::test]
async fn test_unprotected_branch_without_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("feature")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let requires_review = client
        .branch_requires_review(TEST_OWNER, TEST_REPO, "feature")
        .await
        .expect("A 404 without a body must not be an error");

    assert!(!requires_review);
}

#[tokio::test]
async fn test_client_error_with_html_body_is_not_protected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("main")))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_raw("<html><body>Forbidden</body></html>", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let status = client
        .get_branch_protection(TEST_OWNER, TEST_REPO, "main")
        .await
        .expect("A 4xx with a non-JSON body must not be an error");

    assert_eq!(status, ProtectionStatus::NotProtected);
}

#[tokio::test]
async fn test_unauthorized_read_without_body_is_an_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(branch_path("main")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let result = client
        .get_branch_protection(TEST_OWNER, TEST_REPO, "main")
        .await;

    match result {
        Err(Error::AuthError(message)) => assert_eq!(message, "Unauthorized"),
        other => panic!("Expected AuthError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_write_without_body_reports_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(branch_path("main")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let result = client
        .protect_branch(
            TEST_OWNER,
            TEST_REPO,
            "main",
            &BranchProtectionPolicy::default(),
        )
        .await;

    match result {
        Err(Error::ApiError { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_branch_names_are_percent_encoded_on_the_wire() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url": "protection" })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    client
        .protect_branch(
            TEST_OWNER,
            TEST_REPO,
            "fix#12",
            &BranchProtectionPolicy::default(),
        )
        .await
        .expect("Write should succeed");

    let requests = mock_server.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(paths, vec![branch_path("fix%2312")]);
}

#[tokio::test]
async fn test_transport_error_message_is_a_single_line() {
    // Nothing listens on a port released right after binding it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let settings = ClientSettings {
        api_url: format!("http://{address}"),
        ..ClientSettings::default()
    };
    let client = create_token_client(&SecretString::from(TEST_TOKEN.to_string()), &settings)
        .expect("Failed to create token client");

    let result = client
        .get_branch_protection(TEST_OWNER, TEST_REPO, "main")
        .await;

    match result {
        Err(Error::Transport(message)) => {
            assert!(!message.is_empty());
            assert!(!message.contains('\n'), "message was: {message}");
            assert!(!message.contains("Found at"));
        }
        other => panic!("Expected Transport error, got {other:?}"),
    }
}
