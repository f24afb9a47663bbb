//! Integration tests for the MeetNotes backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::search::SearchIndex;
use crate::{create_router, AppState};

/// Test fixture for integration tests. Boots the full router on an
/// ephemeral port with a registered and logged-in user.
struct TestFixture {
    /// Client carrying the default user's bearer token.
    client: Client,
    /// Client without credentials.
    anon: Client,
    base_url: String,
    user_id: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let index_path = temp_dir.path().join("index");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Initialize search index
        let search = Arc::new(SearchIndex::open(&index_path).expect("Failed to init search"));

        // Create config
        let config = Config {
            jwt_secret: "test-secret".to_string(),
            jwt_secret_from_env: true,
            token_ttl_secs: 3600,
            db_path,
            index_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        };

        let state = AppState {
            repo,
            search,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let anon = Client::new();

        // Register and log in the default user
        let register_resp = anon
            .post(format!("{}/api/auth/register", base_url))
            .json(&json!({
                "email": "alice@example.com",
                "name": "Alice",
                "password": "correct-horse-battery"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(register_resp.status(), 200);
        let register_body: Value = register_resp.json().await.unwrap();
        let user_id = register_body["data"]["id"].as_str().unwrap().to_string();

        let login_resp = anon
            .post(format!("{}/api/auth/login", base_url))
            .json(&json!({
                "email": "alice@example.com",
                "password": "correct-horse-battery"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(login_resp.status(), 200);
        let login_body: Value = login_resp.json().await.unwrap();
        let token = login_body["data"]["accessToken"].as_str().unwrap();

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );
        let client = Client::builder().default_headers(headers).build().unwrap();

        TestFixture {
            client,
            anon,
            base_url,
            user_id,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register another user and return its id.
    async fn register_user(&self, email: &str, name: &str) -> String {
        let resp = self
            .anon
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "email": email,
                "name": name,
                "password": "another-password-1"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Create a meeting and return its id.
    async fn create_meeting(&self, title: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/meetings"))
            .json(&json!({ "title": title }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .anon
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_register_and_login() {
    let fixture = TestFixture::new().await;

    let register_resp = fixture
        .anon
        .post(fixture.url("/api/auth/register"))
        .json(&json!({
            "email": "bob@example.com",
            "name": "Bob",
            "password": "a-long-password"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(register_resp.status(), 200);
    let register_body: Value = register_resp.json().await.unwrap();
    assert_eq!(register_body["success"], true);
    assert_eq!(register_body["data"]["email"], "bob@example.com");
    assert_eq!(register_body["data"]["role"], "member");
    assert_eq!(register_body["data"]["status"], "active");
    // The password hash must never appear on the wire
    assert!(register_body["data"].get("password").is_none());
    assert!(register_body["data"].get("passwordHash").is_none());

    // Duplicate email is a conflict
    let duplicate_resp = fixture
        .anon
        .post(fixture.url("/api/auth/register"))
        .json(&json!({
            "email": "bob@example.com",
            "name": "Bob Again",
            "password": "a-long-password"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate_resp.status(), 409);
    let duplicate_body: Value = duplicate_resp.json().await.unwrap();
    assert_eq!(duplicate_body["error"]["code"], "CONFLICT");

    // Wrong password is rejected
    let bad_login = fixture
        .anon
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "bob@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_login.status(), 401);

    // Correct password returns a token and the user
    let login_resp = fixture
        .anon
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "bob@example.com", "password": "a-long-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login_resp.status(), 200);
    let login_body: Value = login_resp.json().await.unwrap();
    assert!(login_body["data"]["accessToken"].as_str().unwrap().len() > 20);
    assert_eq!(login_body["data"]["user"]["name"], "Bob");

    // Login stamps lastLoginAt, visible via /auth/me
    let token = login_body["data"]["accessToken"].as_str().unwrap();
    let me_resp = fixture
        .anon
        .get(fixture.url("/api/auth/me"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(me_resp.status(), 200);
    let me_body: Value = me_resp.json().await.unwrap();
    assert_eq!(me_body["data"]["email"], "bob@example.com");
    assert!(me_body["data"]["lastLoginAt"].is_string());
}

#[tokio::test]
async fn test_register_validation() {
    let fixture = TestFixture::new().await;

    let bad_email = fixture
        .anon
        .post(fixture.url("/api/auth/register"))
        .json(&json!({ "email": "not-an-email", "name": "X", "password": "long-enough-pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_email.status(), 400);

    let short_password = fixture
        .anon
        .post(fixture.url("/api/auth/register"))
        .json(&json!({ "email": "x@example.com", "name": "X", "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(short_password.status(), 400);
    let body: Value = short_password.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_auth_required() {
    let fixture = TestFixture::new().await;

    // No token
    let resp = fixture
        .anon
        .get(fixture.url("/api/meetings"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // Garbage token
    let resp2 = fixture
        .anon
        .get(fixture.url("/api/meetings"))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp2.status(), 401);
}

#[tokio::test]
async fn test_meeting_crud() {
    let fixture = TestFixture::new().await;

    // Create
    let create_resp = fixture
        .client
        .post(fixture.url("/api/meetings"))
        .json(&json!({
            "title": "Sprint Planning",
            "content": { "type": "doc", "content": [] },
            "tags": ["sprint", "planning"],
            "accessLevel": "team"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    assert_eq!(create_body["success"], true);
    let meeting_id = create_body["data"]["id"].as_str().unwrap();
    assert_eq!(create_body["data"]["title"], "Sprint Planning");
    assert_eq!(create_body["data"]["createdBy"], fixture.user_id);

    // Get
    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}", meeting_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["data"]["tags"], json!(["sprint", "planning"]));

    // Update (partial: only the title changes)
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/meetings/{}", meeting_id)))
        .json(&json!({ "title": "Sprint Planning W34" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["title"], "Sprint Planning W34");
    assert_eq!(update_body["data"]["tags"], json!(["sprint", "planning"]));

    // List contains the meeting
    let list_resp = fixture
        .client
        .get(fixture.url("/api/meetings"))
        .send()
        .await
        .unwrap();
    assert_eq!(list_resp.status(), 200);
    let list_body: Value = list_resp.json().await.unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);

    // Soft delete
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/meetings/{}", meeting_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    // Deleted meetings are gone from lookups and listings
    let get_deleted = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}", meeting_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted.status(), 404);

    let list_after: Value = fixture
        .client
        .get(fixture.url("/api/meetings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list_after["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_meeting_content_text_derived() {
    let fixture = TestFixture::new().await;

    let create_resp = fixture
        .client
        .post(fixture.url("/api/meetings"))
        .json(&json!({
            "title": "Kickoff",
            "content": { "type": "doc", "content": [
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "Budget approved by finance" }
                ]}
            ]}
        }))
        .send()
        .await
        .unwrap();
    let body: Value = create_resp.json().await.unwrap();
    assert_eq!(body["data"]["contentText"], "Budget approved by finance");
}

#[tokio::test]
async fn test_trash_and_restore() {
    let fixture = TestFixture::new().await;
    let meeting_id = fixture.create_meeting("Retro").await;

    // Restoring a live meeting is refused
    let not_trashed = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/restore", meeting_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(not_trashed.status(), 409);

    fixture
        .client
        .delete(fixture.url(&format!("/api/meetings/{}", meeting_id)))
        .send()
        .await
        .unwrap();

    // Trash listing shows the meeting with its recovery deadline
    let trash_resp = fixture
        .client
        .get(fixture.url("/api/meetings/trash"))
        .send()
        .await
        .unwrap();
    assert_eq!(trash_resp.status(), 200);
    let trash_body: Value = trash_resp.json().await.unwrap();
    let entries = trash_body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["meeting"]["id"], meeting_id.as_str());
    assert!(entries[0]["meeting"]["deletedAt"].is_string());
    assert!(entries[0]["expiresAt"].is_string());

    // Restore clears deleted_at
    let restore_resp = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/restore", meeting_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(restore_resp.status(), 200);
    let restore_body: Value = restore_resp.json().await.unwrap();
    assert!(restore_body["data"]["deletedAt"].is_null());

    let list_body: Value = fixture
        .client
        .get(fixture.url("/api/meetings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_permanent_delete() {
    let fixture = TestFixture::new().await;
    let meeting_id = fixture.create_meeting("Throwaway").await;

    fixture
        .client
        .delete(fixture.url(&format!("/api/meetings/{}", meeting_id)))
        .send()
        .await
        .unwrap();

    let purge_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/meetings/{}/permanent", meeting_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(purge_resp.status(), 200);

    // Gone from the trash too
    let trash_body: Value = fixture
        .client
        .get(fixture.url("/api/meetings/trash"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(trash_body["data"].as_array().unwrap().is_empty());

    // A second permanent delete is a 404
    let again = fixture
        .client
        .delete(fixture.url(&format!("/api/meetings/{}/permanent", meeting_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_version_numbering_and_restore() {
    let fixture = TestFixture::new().await;
    let meeting_id = fixture.create_meeting("Design Review").await;

    // Snapshot twice
    let v1_resp = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/versions", meeting_id)))
        .json(&json!({
            "content": { "rev": "first draft" },
            "description": "initial notes"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(v1_resp.status(), 200);
    let v1_body: Value = v1_resp.json().await.unwrap();
    assert_eq!(v1_body["data"]["version"], 1);
    let v1_id = v1_body["data"]["id"].as_str().unwrap().to_string();

    let v2_resp = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/versions", meeting_id)))
        .json(&json!({ "content": { "rev": "second draft" } }))
        .send()
        .await
        .unwrap();
    let v2_body: Value = v2_resp.json().await.unwrap();
    assert_eq!(v2_body["data"]["version"], 2);

    // Listing is newest first
    let list_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}/versions", meeting_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let versions = list_body["data"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["version"], 2);
    assert_eq!(versions[1]["version"], 1);
    assert_eq!(versions[1]["changeDescription"], "initial notes");

    // Restoring v1 copies its content back onto the meeting
    let restore_resp = fixture
        .client
        .post(fixture.url(&format!(
            "/api/meetings/{}/versions/{}/restore",
            meeting_id, v1_id
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(restore_resp.status(), 200);
    let restore_body: Value = restore_resp.json().await.unwrap();
    assert_eq!(restore_body["data"]["content"]["rev"], "first draft");

    // Numbering keeps increasing; restore never renumbers
    let v3_resp = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/versions", meeting_id)))
        .json(&json!({ "content": { "rev": "third draft" } }))
        .send()
        .await
        .unwrap();
    let v3_body: Value = v3_resp.json().await.unwrap();
    assert_eq!(v3_body["data"]["version"], 3);

    // Unknown version id is a 404
    let missing = fixture
        .client
        .post(fixture.url(&format!(
            "/api/meetings/{}/versions/{}/restore",
            meeting_id, "no-such-version"
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_links_and_impact() {
    let fixture = TestFixture::new().await;
    let m1 = fixture.create_meeting("Roadmap").await;
    let m2 = fixture.create_meeting("Q3 OKRs").await;

    // Link m1 -> m2
    let link_resp = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/links", m1)))
        .json(&json!({ "targetMeetingId": m2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(link_resp.status(), 200);

    // The same ordered pair is a conflict
    let duplicate = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/links", m1)))
        .json(&json!({ "targetMeetingId": m2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), 409);

    // The reverse direction is a separate edge
    let reverse = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/links", m2)))
        .json(&json!({ "targetMeetingId": m1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(reverse.status(), 200);

    // Self-links are rejected
    let self_link = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/links", m1)))
        .json(&json!({ "targetMeetingId": m1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(self_link.status(), 400);

    // Unknown target is a 404
    let missing_target = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/links", m1)))
        .json(&json!({ "targetMeetingId": "no-such-meeting" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_target.status(), 404);

    // m1's outbound edge points at m2; its inbound edge comes from m2
    let links_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}/links", m1)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let outbound = links_body["data"]["outbound"].as_array().unwrap();
    assert_eq!(outbound.len(), 1);
    assert_eq!(outbound[0]["meetingId"], m2.as_str());
    assert_eq!(outbound[0]["title"], "Q3 OKRs");
    assert_eq!(links_body["data"]["inbound"].as_array().unwrap().len(), 1);

    // Impact of m2: one meeting (m1) links to it
    let impact_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}/impact", m2)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(impact_body["data"]["impactedCount"], 1);
    assert_eq!(impact_body["data"]["impactedMeetings"][0]["id"], m1.as_str());

    // Deleting the edge clears the impact
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/meetings/{}/links/{}", m1, m2)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let impact_after: Value = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}/impact", m2)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(impact_after["data"]["impactedCount"], 0);
}

#[tokio::test]
async fn test_participants() {
    let fixture = TestFixture::new().await;
    let meeting_id = fixture.create_meeting("Standup").await;
    let carol_id = fixture.register_user("carol@example.com", "Carol").await;

    // Add with an explicit role
    let add_resp = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/participants", meeting_id)))
        .json(&json!({ "userId": carol_id, "role": "host" }))
        .send()
        .await
        .unwrap();
    assert_eq!(add_resp.status(), 200);
    let add_body: Value = add_resp.json().await.unwrap();
    assert_eq!(add_body["data"]["role"], "host");
    assert_eq!(add_body["data"]["user"]["name"], "Carol");

    // Adding the same user twice is a conflict
    let duplicate = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/participants", meeting_id)))
        .json(&json!({ "userId": carol_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), 409);

    // Unknown user is a 404
    let missing_user = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/participants", meeting_id)))
        .json(&json!({ "userId": "no-such-user" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_user.status(), 404);

    // List embeds user summaries
    let list_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}/participants", meeting_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let participants = list_body["data"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["user"]["email"], "carol@example.com");

    // Remove
    let remove_resp = fixture
        .client
        .delete(fixture.url(&format!(
            "/api/meetings/{}/participants/{}",
            meeting_id, carol_id
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(remove_resp.status(), 200);

    let remove_again = fixture
        .client
        .delete(fixture.url(&format!(
            "/api/meetings/{}/participants/{}",
            meeting_id, carol_id
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(remove_again.status(), 404);
}

#[tokio::test]
async fn test_permissions() {
    let fixture = TestFixture::new().await;
    let meeting_id = fixture.create_meeting("Architecture Sync").await;
    let dave_id = fixture.register_user("dave@example.com", "Dave").await;

    // A team to grant against
    let team_resp = fixture
        .client
        .post(fixture.url("/api/teams"))
        .json(&json!({ "name": "Platform" }))
        .send()
        .await
        .unwrap();
    let team_body: Value = team_resp.json().await.unwrap();
    let team_id = team_body["data"]["id"].as_str().unwrap().to_string();

    // Grant read to a user
    let user_grant = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/permissions", meeting_id)))
        .json(&json!({ "userId": dave_id, "permission": "read" }))
        .send()
        .await
        .unwrap();
    assert_eq!(user_grant.status(), 200);
    let user_grant_body: Value = user_grant.json().await.unwrap();
    assert_eq!(user_grant_body["data"]["permission"], "read");
    let grant_id = user_grant_body["data"]["id"].as_str().unwrap().to_string();

    // Grant write to a team
    let team_grant = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/permissions", meeting_id)))
        .json(&json!({ "teamId": team_id, "permission": "write" }))
        .send()
        .await
        .unwrap();
    assert_eq!(team_grant.status(), 200);

    // A grant naming neither subject is invalid
    let no_subject = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/permissions", meeting_id)))
        .json(&json!({ "permission": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(no_subject.status(), 400);

    // Unknown permission strings are rejected at the boundary
    let bad_level = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/permissions", meeting_id)))
        .json(&json!({ "userId": dave_id, "permission": "owner" }))
        .send()
        .await
        .unwrap();
    assert!(bad_level.status().is_client_error());

    let list_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}/permissions", meeting_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 2);

    // Revoke the user grant
    let revoke = fixture
        .client
        .delete(fixture.url(&format!(
            "/api/meetings/{}/permissions/{}",
            meeting_id, grant_id
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(revoke.status(), 200);

    let list_after: Value = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}/permissions", meeting_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list_after["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_team_ids_grant_write_on_create() {
    let fixture = TestFixture::new().await;

    let team_resp = fixture
        .client
        .post(fixture.url("/api/teams"))
        .json(&json!({ "name": "Design" }))
        .send()
        .await
        .unwrap();
    let team_body: Value = team_resp.json().await.unwrap();
    let team_id = team_body["data"]["id"].as_str().unwrap().to_string();

    let create_resp = fixture
        .client
        .post(fixture.url("/api/meetings"))
        .json(&json!({ "title": "Design Crit", "teamIds": [team_id] }))
        .send()
        .await
        .unwrap();
    let create_body: Value = create_resp.json().await.unwrap();
    let meeting_id = create_body["data"]["id"].as_str().unwrap();

    let perms_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}/permissions", meeting_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let grants = perms_body["data"].as_array().unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0]["teamId"], team_id.as_str());
    assert_eq!(grants[0]["permission"], "write");
}

#[tokio::test]
async fn test_action_items() {
    let fixture = TestFixture::new().await;
    let meeting_id = fixture.create_meeting("Incident Review").await;
    let erin_id = fixture.register_user("erin@example.com", "Erin").await;

    // Empty description is invalid
    let invalid = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/action-items", meeting_id)))
        .json(&json!({ "description": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), 400);

    let create_resp = fixture
        .client
        .post(fixture.url(&format!("/api/meetings/{}/action-items", meeting_id)))
        .json(&json!({
            "description": "Write the postmortem",
            "assigneeId": erin_id,
            "dueDate": "2025-09-01"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    let item_id = create_body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(create_body["data"]["completed"], false);
    assert!(create_body["data"]["completedAt"].is_null());

    // Completing stamps completedAt
    let complete_resp = fixture
        .client
        .put(fixture.url(&format!("/api/action-items/{}", item_id)))
        .json(&json!({ "completed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(complete_resp.status(), 200);
    let complete_body: Value = complete_resp.json().await.unwrap();
    assert_eq!(complete_body["data"]["completed"], true);
    assert!(complete_body["data"]["completedAt"].is_string());

    // Un-completing clears it
    let reopen_resp = fixture
        .client
        .put(fixture.url(&format!("/api/action-items/{}", item_id)))
        .json(&json!({ "completed": false }))
        .send()
        .await
        .unwrap();
    let reopen_body: Value = reopen_resp.json().await.unwrap();
    assert!(reopen_body["data"]["completedAt"].is_null());

    let list_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/meetings/{}/action-items", meeting_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);

    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/action-items/{}", item_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let delete_again = fixture
        .client
        .delete(fixture.url(&format!("/api/action-items/{}", item_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_again.status(), 404);
}

#[tokio::test]
async fn test_templates() {
    let fixture = TestFixture::new().await;

    let create_resp = fixture
        .client
        .post(fixture.url("/api/templates"))
        .json(&json!({
            "name": "Weekly 1:1",
            "content": { "type": "doc", "content": [] },
            "isDefault": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    let template_id = create_body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(create_body["data"]["isDefault"], true);
    assert_eq!(create_body["data"]["createdBy"], fixture.user_id);

    let get_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/templates/{}", template_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(get_body["data"]["name"], "Weekly 1:1");

    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/templates/{}", template_id)))
        .json(&json!({ "name": "Weekly sync" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);

    let list_body: Value = fixture
        .client
        .get(fixture.url("/api/templates"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);
    assert_eq!(list_body["data"][0]["name"], "Weekly sync");

    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/templates/{}", template_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let get_deleted = fixture
        .client
        .get(fixture.url(&format!("/api/templates/{}", template_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted.status(), 404);
}

#[tokio::test]
async fn test_project_lifecycle() {
    let fixture = TestFixture::new().await;

    // Custom access is meetings-only
    let bad_access = fixture
        .client
        .post(fixture.url("/api/projects"))
        .json(&json!({ "name": "Apollo", "defaultAccessLevel": "custom" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_access.status(), 400);

    let create_resp = fixture
        .client
        .post(fixture.url("/api/projects"))
        .json(&json!({ "name": "Apollo", "defaultAccessLevel": "private" }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    let project_id = create_body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(create_body["data"]["ownerId"], fixture.user_id);
    assert_eq!(create_body["data"]["defaultAccessLevel"], "private");

    // A meeting filed under the project shows up in the detail view
    fixture
        .client
        .post(fixture.url("/api/meetings"))
        .json(&json!({ "title": "Apollo Kickoff", "projectId": project_id }))
        .send()
        .await
        .unwrap();

    let detail_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/projects/{}", project_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let meetings = detail_body["data"]["meetings"].as_array().unwrap();
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0]["title"], "Apollo Kickoff");

    // Update
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/projects/{}", project_id)))
        .json(&json!({ "description": "Moon landing" }))
        .send()
        .await
        .unwrap();
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["description"], "Moon landing");
    assert_eq!(update_body["data"]["name"], "Apollo");

    // Soft delete moves it into the project trash
    fixture
        .client
        .delete(fixture.url(&format!("/api/projects/{}", project_id)))
        .send()
        .await
        .unwrap();

    let list_body: Value = fixture
        .client
        .get(fixture.url("/api/projects"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list_body["data"].as_array().unwrap().is_empty());

    let trash_body: Value = fixture
        .client
        .get(fixture.url("/api/projects/trash"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(trash_body["data"].as_array().unwrap().len(), 1);

    // Restore brings it back
    let restore_resp = fixture
        .client
        .post(fixture.url(&format!("/api/projects/{}/restore", project_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(restore_resp.status(), 200);

    let list_after: Value = fixture
        .client
        .get(fixture.url("/api/projects"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list_after["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_team_lifecycle() {
    let fixture = TestFixture::new().await;
    let frank_id = fixture.register_user("frank@example.com", "Frank").await;

    // Creator becomes leader and a leader-role member
    let create_resp = fixture
        .client
        .post(fixture.url("/api/teams"))
        .json(&json!({ "name": "Backend", "description": "API team" }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    let team_id = create_body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(create_body["data"]["leaderId"], fixture.user_id);
    assert_eq!(create_body["data"]["leader"]["name"], "Alice");
    let members = create_body["data"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["role"], "leader");
    assert_eq!(members[0]["userId"], fixture.user_id);

    // Add a member
    let add_resp = fixture
        .client
        .post(fixture.url(&format!("/api/teams/{}/members", team_id)))
        .json(&json!({ "userId": frank_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(add_resp.status(), 200);
    let add_body: Value = add_resp.json().await.unwrap();
    assert_eq!(add_body["data"]["role"], "member");
    assert_eq!(add_body["data"]["user"]["name"], "Frank");

    // Duplicate membership is a conflict
    let duplicate = fixture
        .client
        .post(fixture.url(&format!("/api/teams/{}/members", team_id)))
        .json(&json!({ "userId": frank_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), 409);

    // Promote
    let promote_resp = fixture
        .client
        .put(fixture.url(&format!("/api/teams/{}/members/{}", team_id, frank_id)))
        .json(&json!({ "role": "leader" }))
        .send()
        .await
        .unwrap();
    assert_eq!(promote_resp.status(), 200);
    let promote_body: Value = promote_resp.json().await.unwrap();
    assert_eq!(promote_body["data"]["role"], "leader");

    let members_body: Value = fixture
        .client
        .get(fixture.url(&format!("/api/teams/{}/members", team_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(members_body["data"].as_array().unwrap().len(), 2);

    // Remove
    let remove_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/teams/{}/members/{}", team_id, frank_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(remove_resp.status(), 200);

    // Soft delete and restore
    fixture
        .client
        .delete(fixture.url(&format!("/api/teams/{}", team_id)))
        .send()
        .await
        .unwrap();

    let get_deleted = fixture
        .client
        .get(fixture.url(&format!("/api/teams/{}", team_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted.status(), 404);

    let restore_resp = fixture
        .client
        .post(fixture.url(&format!("/api/teams/{}/restore", team_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(restore_resp.status(), 200);

    let get_restored = fixture
        .client
        .get(fixture.url(&format!("/api/teams/{}", team_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_restored.status(), 200);
}

#[tokio::test]
async fn test_meeting_search() {
    let fixture = TestFixture::new().await;

    fixture
        .client
        .post(fixture.url("/api/meetings"))
        .json(&json!({
            "title": "Database Migration Plan",
            "contentText": "cut over the orders table with zero downtime",
            "tags": ["infra"]
        }))
        .send()
        .await
        .unwrap();

    let trashed_id = fixture
        .client
        .post(fixture.url("/api/meetings"))
        .json(&json!({
            "title": "Old Migration Notes",
            "contentText": "superseded migration checklist"
        }))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap()["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    fixture
        .client
        .delete(fixture.url(&format!("/api/meetings/{}", trashed_id)))
        .send()
        .await
        .unwrap();

    // Wait for search index to update
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let search_body: Value = fixture
        .client
        .get(fixture.url("/api/meetings/search?q=migration&limit=10"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(search_body["success"], true);

    let results = search_body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["meeting"]["title"], "Database Migration Plan");
    assert!(results[0]["score"].as_f64().unwrap() > 0.0);

    // Body text is searchable too
    let body_search: Value = fixture
        .client
        .get(fixture.url("/api/meetings/search?q=downtime&limit=10"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body_search["data"]["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_user_search_and_profile_update() {
    let fixture = TestFixture::new().await;
    fixture.register_user("grace@example.com", "Grace").await;

    let search_body: Value = fixture
        .client
        .get(fixture.url("/api/users/search?q=grace"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let hits = search_body["data"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["email"], "grace@example.com");

    // Update own profile
    let update_resp = fixture
        .client
        .put(fixture.url("/api/users/me"))
        .json(&json!({ "name": "Alice Liddell" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["name"], "Alice Liddell");

    // Empty name is invalid
    let invalid = fixture
        .client
        .put(fixture.url("/api/users/me"))
        .json(&json!({ "name": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), 400);
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/meetings/non-existent-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let resp2 = fixture
        .client
        .get(fixture.url("/api/projects/non-existent-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp2.status(), 404);

    let resp3 = fixture
        .client
        .get(fixture.url("/api/meetings/non-existent-id/versions"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp3.status(), 404);
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::new().await;

    // Meeting without a title
    let resp = fixture
        .client
        .post(fixture.url("/api/meetings"))
        .json(&json!({ "title": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Team without a name
    let resp2 = fixture
        .client
        .post(fixture.url("/api/teams"))
        .json(&json!({ "name": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp2.status(), 400);
}
