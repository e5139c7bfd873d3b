#![allow(clippy::unwrap_used)]
// End-to-end console flows against a wiremock clinic API.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medicore_core::{
    CacheState, Console, ConsoleConfig, GuardDecision, GuardState, LoginCredentials, NewDoctor,
    Route, Session,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer, cache_dir: Option<std::path::PathBuf>) -> ConsoleConfig {
    ConsoleConfig {
        api_url: Url::parse(&format!("{}/api/v1/", server.uri())).unwrap(),
        timeout: Duration::from_secs(5),
        cache_dir,
        credentials: None,
    }
}

fn doctor(id: &str) -> Value {
    json!({
        "_id": id,
        "firstName": "Doc",
        "lastName": id,
        "email": format!("{id}@clinic.test"),
        "doctorDepartment": "Pediatrics",
        "role": "Doctor"
    })
}

fn credentials() -> LoginCredentials {
    LoginCredentials {
        email: "admin@example.com".into(),
        password: "Admin@123".to_string().into(),
    }
}

fn new_doctor() -> NewDoctor {
    NewDoctor {
        first_name: "Doc".into(),
        last_name: "D3".into(),
        email: "d3@clinic.test".into(),
        phone: "03001234567".into(),
        nic: "4210112345678".into(),
        dob: "1980-01-01".into(),
        gender: "Female".into(),
        password: "secret123".to_string().into(),
        doctor_department: "Pediatrics".into(),
        avatar: None,
    }
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/user/admin/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Admin Not Authenticated!"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/user/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "adminToken=abc123; Path=/")
                .set_body_json(json!({
                    "success": true,
                    "message": "Login Successfully!",
                    "user": { "_id": "a1", "firstName": "Ada", "lastName": "Admin", "role": "Admin" }
                })),
        )
        .mount(server)
        .await;
}

async fn doctor_fetches(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == "/api/v1/user/doctors")
        .count()
}

// ── Scenario ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_view_and_invalidation_round_trip() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "doctors": [doctor("D1"), doctor("D2")]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "doctors": [doctor("D1"), doctor("D2"), doctor("D3")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/doctor/addnew"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "New Doctor Registered"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let console = Console::from_config(&config(&server, None)).unwrap();
    let mut guard = console.guard();
    assert_eq!(guard.check(Route::Doctors), GuardDecision::Placeholder);

    // Probe answers 401: anonymous, protected views bounce to login.
    assert_eq!(console.bootstrap().await, Session::Anonymous);
    assert_eq!(guard.state(), GuardState::Unauthorized);
    assert_eq!(
        guard.settle(Route::Doctors).await,
        GuardDecision::Redirect(Route::Login)
    );

    console.authenticate(&credentials()).await.unwrap();
    assert_eq!(guard.check(Route::Doctors), GuardDecision::Render(Route::Doctors));

    let mut view = console.view_doctors().await;
    assert!(view.snapshot().is_populated());
    assert_eq!(view.snapshot().len(), 2);
    assert_eq!(doctor_fetches(&server).await, 1);

    // A second screen on the same collection reuses the cache.
    let other = console.view_doctors().await;
    assert_eq!(other.snapshot().len(), 2);
    assert_eq!(doctor_fetches(&server).await, 1);

    // The add-doctor flow publishes; mounted views refresh.
    let message = console.add_doctor(&new_doctor()).await.unwrap();
    assert_eq!(message, "New Doctor Registered");

    let fresh = view.until_fresh().await.unwrap();
    assert_eq!(fresh.len(), 3);
    assert_eq!(console.doctors().get().items()[2].id, "D3");
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_good_collection() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "doctors": [doctor("A"), doctor("B")]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/doctors"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "message": "Internal Server Error"
        })))
        .mount(&server)
        .await;

    let console = Console::from_config(&config(&server, None)).unwrap();
    let mut notices = console.notices().subscribe();
    console.bootstrap().await;
    console.authenticate(&credentials()).await.unwrap();

    console.doctors().ensure_fresh().await.unwrap();
    let err = console.doctors().refresh().await.unwrap_err();

    assert_eq!(err.status, Some(500));
    let ids: Vec<_> = console
        .doctors()
        .get()
        .items()
        .iter()
        .map(|d| d.id.clone())
        .collect();
    assert_eq!(ids, ["A", "B"]);

    let mut messages = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        messages.push(notice.message);
    }
    assert!(messages.contains(&"Internal Server Error".to_string()));
}

#[tokio::test]
async fn test_warm_start_from_cache_dir() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "doctors": [doctor("D1")]
        })))
        .mount(&server)
        .await;
    let cache = tempfile::tempdir().unwrap();

    let first = Console::from_config(&config(&server, Some(cache.path().to_path_buf()))).unwrap();
    first.doctors().ensure_fresh().await.unwrap();
    drop(first);

    let second = Console::from_config(&config(&server, Some(cache.path().to_path_buf()))).unwrap();
    assert_eq!(second.doctors().state(), CacheState::Seeded);
    assert_eq!(second.doctors().get().items()[0].id, "D1");
    // Seeded data is for display; the first mount still fetches.
    second.doctors().ensure_fresh().await.unwrap();
    assert_eq!(doctor_fetches(&server).await, 2);
}
