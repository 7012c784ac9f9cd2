use fixture_double::errors::FixtureError;
use fixture_double::fingerprint::ScopeId;
use fixture_double::normalizer::Normalizer;
use fixture_double::runtime::{FakeTransport, HttpTransport, ProductionFileSystem};
use fixture_double::store::FixtureStore;
use fixture_double::types::{HttpRequest, HttpResponse};
use fixture_double::InteractionRouter;
use std::path::Path;
use std::sync::Arc;

// ── helpers ───────────────────────────────────────────────────────────────────

fn disk_store(root: &Path) -> FixtureStore {
    FixtureStore::new(root, Arc::new(ProductionFileSystem))
}

fn live(project_id: &str, api_key: &str) -> Normalizer {
    Normalizer::new(project_id, api_key)
}

fn create_folder_request(project_id: &str, api_key: &str) -> HttpRequest {
    HttpRequest::new(
        "POST",
        format!("https://manage.example.test/v2/projects/{project_id}/folders"),
    )
    .with_header("Authorization", format!("Bearer {api_key}"))
    .with_header("Content-Type", "application/json")
    .with_body("{\r\n  \"name\": \"Reports\",\r\n  \"folders\": []\r\n}")
}

fn create_folder_response(project_id: &str) -> HttpResponse {
    HttpResponse::new(
        201,
        format!(
            "{{\"id\":\"f-1\",\"name\":\"Reports\",\"project_id\":\"{project_id}\",\"folders\":[]}}"
        ),
    )
    .with_reason("Created")
    .with_header(
        "Location",
        format!("https://manage.example.test/v2/projects/{project_id}/folders/f-1"),
    )
}

fn list_request(project_id: &str, api_key: &str, page: u32) -> HttpRequest {
    HttpRequest::new(
        "GET",
        format!("https://manage.example.test/v2/projects/{project_id}/items?page={page}"),
    )
    .with_header("Authorization", format!("Bearer {api_key}"))
}

fn record_all(
    root: &Path,
    test_name: &str,
    requests: Vec<HttpRequest>,
    responses: Vec<HttpResponse>,
) -> Vec<HttpResponse> {
    let transport = Arc::new(FakeTransport::default());
    for response in responses {
        transport.push_response(Ok(response));
    }
    let router = InteractionRouter::record(
        test_name,
        disk_store(root),
        live("abc-123", "secret-key"),
        transport,
    );
    requests
        .into_iter()
        .map(|request| router.send(request).expect("record request"))
        .collect()
}

// ── scenario ──────────────────────────────────────────────────────────────────

#[test]
fn folders_create_folder_records_portably_and_replays_with_live_secrets() {
    let temp = tempfile::tempdir().expect("tempdir");
    let recorded = record_all(
        temp.path(),
        "Folders_createFolder",
        vec![create_folder_request("abc-123", "secret-key")],
        vec![create_folder_response("abc-123")],
    );
    assert_eq!(recorded[0], create_folder_response("abc-123"));

    let scope = ScopeId::from_test_name("Folders_createFolder");
    assert!(scope.as_str().starts_with("Folders_"));
    let store = disk_store(temp.path());
    let fixtures = store.list(&scope).expect("list fixtures");
    assert_eq!(fixtures.len(), 1);
    assert!(fixtures[0].starts_with("POST_"));

    let fixture_dir = store.scope_path(&scope).join(&fixtures[0]);
    let request_meta =
        std::fs::read_to_string(fixture_dir.join("request.json")).expect("request.json");
    assert!(request_meta.contains("{PROJECT_ID}"));
    assert!(request_meta.contains("Bearer {API_KEY}"));
    assert!(!request_meta.contains("abc-123"));
    assert!(!request_meta.contains("secret-key"));
    let response_content = std::fs::read_to_string(fixture_dir.join("response_content.json"))
        .expect("response_content.json");
    assert!(response_content.contains("\"project_id\":\"{PROJECT_ID}\""));

    let replay = InteractionRouter::replay(
        "Folders_createFolder",
        disk_store(temp.path()),
        live("xyz-999", "other-key"),
    );
    let response = replay
        .send(create_folder_request("xyz-999", "other-key"))
        .expect("replay");
    assert_eq!(response.status, 201);
    assert_eq!(response.reason.as_deref(), Some("Created"));
    assert!(response.body.contains("\"project_id\":\"xyz-999\""));
    assert!(!response.body.contains("{PROJECT_ID}"));
    assert!(!response.body.contains("{API_KEY}"));
    assert_eq!(
        response.headers[0].value,
        "https://manage.example.test/v2/projects/xyz-999/folders/f-1"
    );
}

#[test]
fn replayed_sequence_matches_recorded_sequence() {
    let temp = tempfile::tempdir().expect("tempdir");
    let requests = (1..=3)
        .map(|page| list_request("abc-123", "secret-key", page))
        .collect::<Vec<_>>();
    let responses = (1..=3)
        .map(|page| {
            HttpResponse::new(
                200,
                format!("{{\"items\":[\"item-{page}\"],\"pagination\":{{\"next_page\":{}}}}}", page + 1),
            )
            .with_header("X-Continuation", format!("token-{page}"))
        })
        .collect::<Vec<_>>();
    let recorded = record_all(temp.path(), "Items_listAll", requests.clone(), responses);

    let replay = InteractionRouter::replay(
        "Items_listAll",
        disk_store(temp.path()),
        live("abc-123", "secret-key"),
    );
    for (request, expected) in requests.into_iter().zip(recorded) {
        assert_eq!(replay.send(request).expect("replay"), expected);
    }
}

#[test]
fn replay_ignores_carriage_returns_in_request_body() {
    let temp = tempfile::tempdir().expect("tempdir");
    record_all(
        temp.path(),
        "Folders_createFolder",
        vec![create_folder_request("abc-123", "secret-key")],
        vec![create_folder_response("abc-123")],
    );

    let mut unix_request = create_folder_request("abc-123", "secret-key");
    unix_request.body = unix_request.body.map(|body| body.replace('\r', ""));
    let replay = InteractionRouter::replay(
        "Folders_createFolder",
        disk_store(temp.path()),
        live("abc-123", "secret-key"),
    );
    assert_eq!(
        replay.send(unix_request).expect("replay"),
        create_folder_response("abc-123")
    );
}

// ── lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn second_recording_run_leaves_only_its_own_fixtures() {
    let temp = tempfile::tempdir().expect("tempdir");
    record_all(
        temp.path(),
        "Items_listAll",
        vec![
            list_request("abc-123", "secret-key", 1),
            list_request("abc-123", "secret-key", 2),
        ],
        vec![HttpResponse::new(200, "one"), HttpResponse::new(200, "two")],
    );
    record_all(
        temp.path(),
        "Items_listAll",
        vec![list_request("abc-123", "secret-key", 3)],
        vec![HttpResponse::new(200, "three")],
    );

    let scope = ScopeId::from_test_name("Items_listAll");
    assert_eq!(disk_store(temp.path()).list(&scope).expect("list").len(), 1);

    let replay = InteractionRouter::replay(
        "Items_listAll",
        disk_store(temp.path()),
        live("abc-123", "secret-key"),
    );
    assert_eq!(
        replay
            .send(list_request("abc-123", "secret-key", 3))
            .expect("fresh fixture")
            .body,
        "three"
    );
    assert!(matches!(
        replay.send(list_request("abc-123", "secret-key", 1)),
        Err(FixtureError::FixtureNotFound { .. })
    ));
}

#[test]
fn recording_one_scope_does_not_touch_another() {
    let temp = tempfile::tempdir().expect("tempdir");
    record_all(
        temp.path(),
        "Items_listAll",
        vec![list_request("abc-123", "secret-key", 1)],
        vec![HttpResponse::new(200, "items")],
    );
    record_all(
        temp.path(),
        "Items_listFirst",
        vec![list_request("abc-123", "secret-key", 1)],
        vec![HttpResponse::new(200, "first")],
    );

    let store = disk_store(temp.path());
    assert_eq!(
        store
            .list(&ScopeId::from_test_name("Items_listAll"))
            .expect("list all")
            .len(),
        1
    );
    assert_eq!(
        store
            .list(&ScopeId::from_test_name("Items_listFirst"))
            .expect("list first")
            .len(),
        1
    );
}

// ── failures ──────────────────────────────────────────────────────────────────

#[test]
fn replay_of_changed_request_reports_normalized_request() {
    let temp = tempfile::tempdir().expect("tempdir");
    record_all(
        temp.path(),
        "Folders_createFolder",
        vec![create_folder_request("abc-123", "secret-key")],
        vec![create_folder_response("abc-123")],
    );

    let changed = create_folder_request("abc-123", "secret-key").with_body("{\"name\":\"Other\"}");
    let replay = InteractionRouter::replay(
        "Folders_createFolder",
        disk_store(temp.path()),
        live("abc-123", "secret-key"),
    );
    match replay.send(changed) {
        Err(FixtureError::FixtureNotFound {
            method,
            target,
            request,
            request_content,
            path,
        }) => {
            assert_eq!(method, "POST");
            assert_eq!(
                target,
                "https://manage.example.test/v2/projects/{PROJECT_ID}/folders"
            );
            assert!(request.contains("Bearer {API_KEY}"));
            assert_eq!(request_content, "{\"name\":\"Other\"}");
            assert!(!Path::new(&path).exists());
        }
        other => panic!("expected FixtureNotFound, got {other:?}"),
    }
}

#[test]
fn replay_never_calls_the_transport() {
    let temp = tempfile::tempdir().expect("tempdir");
    let transport = Arc::new(FakeTransport::default());
    transport.push_response(Ok(HttpResponse::new(200, "live")));
    let cfg = fixture_double::config::FixtureConfig {
        fixtures: fixture_double::config::FixturesConfig {
            root: temp.path().to_path_buf(),
        },
        ..fixture_double::config::FixtureConfig::default()
    };
    let router = InteractionRouter::from_config(
        &cfg,
        "Items_listAll",
        Arc::new(ProductionFileSystem),
        Some(transport.clone() as Arc<dyn HttpTransport>),
    )
    .expect("replay router");

    assert!(router.send(list_request("abc-123", "secret-key", 1)).is_err());
    assert!(transport.sent().is_empty());
}
