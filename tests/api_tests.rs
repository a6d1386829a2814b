// tests/api_tests.rs
//
// End-to-end tests against a live Postgres. Run with DATABASE_URL pointing
// at a scratch database:
//
//   DATABASE_URL=postgres://... cargo test -- --ignored

use std::net::SocketAddr;

use medprep::{config::Config, routes, scoring::locks::ScoringLocks, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool,
        config,
        locks: ScoringLocks::new(),
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Connect info is required by the rate limiter's peer-IP key extractor.
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    address
}

async fn test_pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test DB")
}

/// Seeds one specialty, one scenario, one checklist and four weighted items
/// (weights 1, 1, 2, 1; the first two share a category). Returns
/// (checklist_id, item_ids).
async fn seed_checklist(pool: &PgPool) -> (i64, Vec<i64>) {
    let tag = &uuid::Uuid::new_v4().to_string()[..8];

    let specialty_id: i64 = sqlx::query_scalar(
        "INSERT INTO specialties (name, code) VALUES ($1, $2) RETURNING id",
    )
    .bind(format!("Specialty {}", tag))
    .bind(&tag[..6])
    .fetch_one(pool)
    .await
    .unwrap();

    let scenario_id: i64 = sqlx::query_scalar(
        "INSERT INTO scenarios (title, specialty_id, difficulty)
         VALUES ($1, $2, 'medium') RETURNING id",
    )
    .bind(format!("Scenario {}", tag))
    .bind(specialty_id)
    .fetch_one(pool)
    .await
    .unwrap();

    let checklist_id: i64 = sqlx::query_scalar(
        "INSERT INTO checklists (title, scenario_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(format!("Checklist {}", tag))
    .bind(scenario_id)
    .fetch_one(pool)
    .await
    .unwrap();

    let category_id: i64 =
        sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
            .bind(format!("Category {}", tag))
            .fetch_one(pool)
            .await
            .unwrap();

    let mut item_ids = Vec::new();
    for (weight, category) in [
        (1.0_f64, Some(category_id)),
        (1.0, Some(category_id)),
        (2.0, None),
        (1.0, None),
    ] {
        let item_id: i64 = sqlx::query_scalar(
            "INSERT INTO checklist_items (checklist_id, category_id, description, weight)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(checklist_id)
        .bind(category)
        .bind(format!("Item for {}", tag))
        .bind(weight)
        .fetch_one(pool)
        .await
        .unwrap();
        item_ids.push(item_id);
    }

    (checklist_id, item_ids)
}

/// Registers and logs in a fresh user, returning (user_id, token).
async fn register_and_login(client: &reqwest::Client, address: &str) -> (i64, String) {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let register_resp = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(register_resp.status().as_u16(), 201);
    let user: serde_json::Value = register_resp.json().await.unwrap();
    let user_id = user["id"].as_i64().expect("User id not found");

    let login_resp = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");
    let token = login_resp["token"].as_str().expect("Token not found");

    (user_id, token.to_string())
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn health_check_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn attempts_require_auth() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/attempts", address))
        .json(&serde_json::json!({ "checklist_id": 1 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn completing_a_foreign_attempt_is_forbidden() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    let (checklist_id, _items) = seed_checklist(&pool).await;
    let (_owner_id, owner_token) = register_and_login(&client, &address).await;
    let (_other_id, other_token) = register_and_login(&client, &address).await;

    let attempt: serde_json::Value = client
        .post(&format!("{}/api/attempts", address))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&serde_json::json!({ "checklist_id": checklist_id }))
        .send()
        .await
        .expect("Create attempt failed")
        .json()
        .await
        .unwrap();
    let attempt_id = attempt["id"].as_i64().unwrap();

    let response = client
        .patch(&format!("{}/api/attempts/{}/complete", address, attempt_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .json(&serde_json::json!({ "responses": [] }))
        .send()
        .await
        .expect("Complete failed");

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn full_scoring_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    // Weights 1, 1, 2, 1; completing items 2 and 3 earns 3 of 5.
    let (checklist_id, items) = seed_checklist(&pool).await;
    let (user_id, token) = register_and_login(&client, &address).await;

    // 1. Start an attempt
    let attempt: serde_json::Value = client
        .post(&format!("{}/api/attempts", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "checklist_id": checklist_id }))
        .send()
        .await
        .expect("Create attempt failed")
        .json()
        .await
        .unwrap();
    let attempt_id = attempt["id"].as_i64().unwrap();
    assert_eq!(attempt["completed"], false);

    // 2. Complete it
    let complete_resp = client
        .patch(&format!("{}/api/attempts/{}/complete", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "responses": [
                { "checklist_item_id": items[1], "completed": true },
                { "checklist_item_id": items[2], "completed": true },
                { "checklist_item_id": items[3], "completed": false }
            ]
        }))
        .send()
        .await
        .expect("Complete failed");
    assert_eq!(complete_resp.status().as_u16(), 200);

    let result: serde_json::Value = complete_resp.json().await.unwrap();
    assert_eq!(result["score"], 6.0);
    assert!(result.get("warning").is_none());

    // 3. Completing again is rejected
    let again = client
        .patch(&format!("{}/api/attempts/{}/complete", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "responses": [] }))
        .send()
        .await
        .expect("Second complete failed");
    assert_eq!(again.status().as_u16(), 409);

    // 4. Aggregates landed on the profile
    let me: serde_json::Value = client
        .get(&format!("{}/api/auth/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Me failed")
        .json()
        .await
        .unwrap();
    assert_eq!(me["score"], 6.0);
    assert_eq!(me["practice_count"], 1);
    assert!(me["rank"].as_i64().is_some());
    assert!(me.get("password").is_none());

    // 5. Category metric: items 1 and 2 share the only category, one of the
    // two was completed.
    let metrics: Vec<serde_json::Value> = client
        .get(&format!("{}/api/users/{}/performance", address, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Performance failed")
        .json()
        .await
        .unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0]["score"], 5.0);
    assert_eq!(metrics[0]["attempt_count"], 1);

    // 6. Specialty metric mirrors the attempt score
    let specialty_metrics: Vec<serde_json::Value> = client
        .get(&format!(
            "{}/api/users/{}/specialty-performance",
            address, user_id
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Specialty performance failed")
        .json()
        .await
        .unwrap();
    assert_eq!(specialty_metrics.len(), 1);
    assert_eq!(specialty_metrics[0]["score"], 6.0);
    assert_eq!(specialty_metrics[0]["attempts"], 1);

    // 7. 6.0 is below the remediation bar, so the scenario comes back as a
    // recommendation.
    let recommendations: Vec<serde_json::Value> = client
        .get(&format!("{}/api/recommendations", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Recommendations failed")
        .json()
        .await
        .unwrap();
    let scenario_id = attempt_scenario_id(&pool, attempt_id).await;
    assert!(
        recommendations
            .iter()
            .any(|s| s["id"].as_i64() == Some(scenario_id)),
        "low-scoring scenario should be recommended"
    );

    // 8. Dashboard aggregates everything in one payload
    let dashboard: serde_json::Value = client
        .get(&format!("{}/api/dashboard", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Dashboard failed")
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["user"]["score"], 6.0);
    assert_eq!(dashboard["recent_attempts"].as_array().unwrap().len(), 1);
    assert!(!dashboard["ranking"].as_array().unwrap().is_empty());
}

async fn attempt_scenario_id(pool: &PgPool, attempt_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT c.scenario_id FROM attempts a
         JOIN checklists c ON c.id = a.checklist_id
         WHERE a.id = $1",
    )
    .bind(attempt_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
