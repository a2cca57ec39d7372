//! Registration: record sets per role, validation, conflicts and rollback.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use plated_core::{IdentityId, PlannedRecord, RoleKind, StaffRole, record_plan};
use plated_integration_tests::{PASSWORD, TestApp, registration};
use plated_server::db::{AccountStore, RowCounts};

fn identity_id(body: &serde_json::Value) -> IdentityId {
    IdentityId::new(i32::try_from(body["identityId"].as_i64().unwrap()).unwrap())
}

#[tokio::test]
async fn test_customer_registration_creates_three_records() {
    let app = TestApp::new();
    let mut client = app.client();

    let resp = client
        .post(
            "/auth/register",
            &registration("Ada Diner", "ada@test.com", "customer"),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    assert_eq!(
        app.store.row_counts().await,
        RowCounts {
            identities: 1,
            credentials: 1,
            customers: 1,
            ..RowCounts::default()
        }
    );

    let login = client
        .post(
            "/auth/login",
            &json!({ "email": "ada@test.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.json()["activeRole"]["type"], "customer");
}

#[tokio::test]
async fn test_manager_registration_example() {
    let app = TestApp::new();
    let mut client = app.client();

    let resp = client
        .post(
            "/auth/register",
            &json!({
                "name": "Test Manager",
                "email": "manager@test.com",
                "password": "TestPass123!",
                "confirm": "TestPass123!",
                "role": "manager",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let id = identity_id(&resp.json());

    let roles = app.store.load_roles(id).await.unwrap();
    assert!(roles.has(RoleKind::Manager));
    assert!(roles.has(RoleKind::Customer));
    assert_eq!(roles.records().len(), 2);
    assert_eq!(roles.staff().len(), 1);
    assert_eq!(roles.staff()[0].role, StaffRole::Manager);

    let login = client
        .post(
            "/auth/login",
            &json!({ "email": "manager@test.com", "password": "TestPass123!" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let active = &login.json()["activeRole"];
    assert_eq!(active["type"], "manager");
    assert_eq!(active["staffId"], roles.staff()[0].id.as_i32());
    assert!(active["restaurantId"].is_null());
}

#[tokio::test]
async fn test_driver_registration() {
    let app = TestApp::new();
    let mut client = app.client();

    let login = client
        .register_and_login("Dee Driver", "dee@test.com", "driver")
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.json()["activeRole"]["type"], "driver");

    let counts = app.store.row_counts().await;
    assert_eq!(counts.staff, 1);
    assert_eq!(counts.delivery_agents, 1);
    assert_eq!(counts.customers, 1);
    assert_eq!(counts.managers, 0);
}

#[tokio::test]
async fn test_admin_registration_has_no_customer_record() {
    let app = TestApp::new();
    let mut client = app.client();

    let login = client
        .register_and_login("Root", "root@test.com", "admin")
        .await;
    assert_eq!(login.json()["activeRole"]["type"], "admin");

    let counts = app.store.row_counts().await;
    assert_eq!(counts.admins, 1);
    assert_eq!(counts.customers, 0);
}

#[tokio::test]
async fn test_second_admin_is_conflict() {
    let app = TestApp::new();
    let mut client = app.client();

    let exists = client.get("/auth/admin-exists").await;
    assert_eq!(exists.json()["adminExists"], false);

    let first = client
        .post(
            "/auth/register",
            &registration("Admin One", "a1@test.com", "admin"),
        )
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = client
        .post(
            "/auth/register",
            &registration("Admin Two", "a2@test.com", "admin"),
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let exists = client.get("/auth/admin-exists").await;
    assert_eq!(exists.json()["adminExists"], true);
    assert_eq!(app.store.row_counts().await.identities, 1);
}

#[tokio::test]
async fn test_concurrent_admin_registrations_create_one_admin() {
    let app = TestApp::new();
    let mut first = app.client();
    let mut second = app.client();

    let body_one = registration("Admin One", "a1@test.com", "admin");
    let body_two = registration("Admin Two", "a2@test.com", "admin");
    let (one, two) = tokio::join!(
        first.post("/auth/register", &body_one),
        second.post("/auth/register", &body_two),
    );

    let mut statuses = [one.status.as_u16(), two.status.as_u16()];
    statuses.sort_unstable();
    assert_eq!(
        statuses,
        [StatusCode::CREATED.as_u16(), StatusCode::CONFLICT.as_u16()]
    );

    let counts = app.store.row_counts().await;
    assert_eq!(counts.admins, 1);
    assert_eq!(counts.identities, 1);
    assert_eq!(counts.credentials, 1);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict_regardless_of_case() {
    let app = TestApp::new();
    let mut client = app.client();

    client
        .post(
            "/auth/register",
            &registration("Ada", "ada@test.com", "customer"),
        )
        .await;
    let resp = client
        .post(
            "/auth/register",
            &registration("Ada Again", "ADA@Test.com", "driver"),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(app.store.row_counts().await.identities, 1);
}

#[tokio::test]
async fn test_failure_at_any_record_leaves_no_rows() {
    for role in RoleKind::BY_PRIORITY {
        for record in record_plan(role) {
            let app = TestApp::new();
            app.store.fail_on(Some(*record)).await;

            let resp = app
                .client()
                .post(
                    "/auth/register",
                    &registration("Rollback", "rollback@test.com", role.as_str()),
                )
                .await;

            assert_eq!(
                resp.status,
                StatusCode::INTERNAL_SERVER_ERROR,
                "{role} failing at {record:?}"
            );
            assert_eq!(
                app.store.row_counts().await.total(),
                0,
                "{role} failing at {record:?}"
            );
        }
    }
}

#[tokio::test]
async fn test_staff_failure_then_retry_succeeds() {
    let app = TestApp::new();
    app.store
        .fail_on(Some(PlannedRecord::Staff(StaffRole::Manager)))
        .await;
    let mut client = app.client();

    let body = registration("Retry", "retry@test.com", "manager");
    let failed = client.post("/auth/register", &body).await;
    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(failed.json()["error"], "Internal server error");

    app.store.fail_on(None).await;
    let retried = client.post("/auth/register", &body).await;
    assert_eq!(retried.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_each_password_rule_is_enforced() {
    let app = TestApp::new();
    let mut client = app.client();

    let weak = ["Tp1!abc", "testpass123!", "TESTPASS123!", "TestPassword!", "TestPass1234"];
    for password in weak {
        let mut body = registration("Weak", "weak@test.com", "customer");
        body["password"] = json!(password);
        body["confirm"] = json!(password);

        let resp = client.post("/auth/register", &body).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{password}");
        assert_eq!(resp.json()["details"].as_array().unwrap().len(), 1);
    }

    assert_eq!(app.store.row_counts().await.total(), 0);
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let app = TestApp::new();
    let mut client = app.client();

    let mut mismatch = registration("Ada", "ada@test.com", "customer");
    mismatch["confirm"] = json!("TestPass123?");
    let resp = client.post("/auth/register", &mismatch).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "passwords do not match");

    let unknown_role = registration("Ada", "ada@test.com", "owner");
    let resp = client.post("/auth/register", &unknown_role).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let bad_email = registration("Ada", "not-an-email", "customer");
    let resp = client.post("/auth/register", &bad_email).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let blank_name = registration("  ", "ada@test.com", "customer");
    let resp = client.post("/auth/register", &blank_name).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.store.row_counts().await.total(), 0);
}

#[tokio::test]
async fn test_malformed_bodies_are_json_bad_requests() {
    let app = TestApp::new();
    let mut client = app.client();

    let mut missing_role = registration("Ada", "ada@test.com", "customer");
    missing_role.as_object_mut().unwrap().remove("role");
    let resp = client.post("/auth/register", &missing_role).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let error = resp.json()["error"].as_str().unwrap().to_owned();
    assert!(error.contains("role"), "{error}");

    let mut wrong_type = registration("Ada", "ada@test.com", "customer");
    wrong_type["name"] = json!(42);
    let resp = client.post("/auth/register", &wrong_type).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["error"].is_string());

    assert_eq!(app.store.row_counts().await.total(), 0);
}
