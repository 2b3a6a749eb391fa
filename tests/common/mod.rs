#![allow(dead_code)]

use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use portaria::config::{Config, MarketingConfig};

pub const TEST_PIN: &str = "4321";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn login(&self, pin: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "pin": pin }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Log in with the test PIN and return the session token.
    pub async fn token(&self) -> String {
        let (body, status) = self.login(TEST_PIN).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Call a query procedure. Returns the `result.data` on success, or the
    /// whole error body otherwise.
    pub async fn query(&self, token: Option<&str>, procedure: &str, input: &Value) -> (Value, StatusCode) {
        let mut url = reqwest::Url::parse(&self.url(&format!("/api/trpc/{procedure}"))).unwrap();
        if !input.is_null() {
            url.query_pairs_mut().append_pair("input", &input.to_string());
        }
        let mut req = self.client.get(url);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        unwrap_rpc(req.send().await.expect("query request failed")).await
    }

    pub async fn mutate(&self, token: Option<&str>, procedure: &str, input: &Value) -> (Value, StatusCode) {
        let mut req = self
            .client
            .post(self.url(&format!("/api/trpc/{procedure}")))
            .json(input);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        unwrap_rpc(req.send().await.expect("mutation request failed")).await
    }

    /// Create a ticket type priced in reais, return its JSON.
    pub async fn create_ticket_type(&self, token: &str, name: &str, price: f64) -> Value {
        let (body, status) = self
            .mutate(
                Some(token),
                "ticketTypes.create",
                &json!({ "name": name, "price": price }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create ticket type failed: {body}");
        body
    }

    /// Sell one ticket of `ticket_type_id`, return the created ticket JSON.
    pub async fn sell(&self, token: &str, ticket_type_id: i64, payment_method: &str) -> Value {
        let (body, status) = self
            .mutate(
                Some(token),
                "tickets.create",
                &json!({
                    "customerName": "Maria Silva",
                    "ticketTypeId": ticket_type_id,
                    "paymentMethod": payment_method,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "sell failed: {body}");
        body
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed")
    }
}

async fn unwrap_rpc(resp: reqwest::Response) -> (Value, StatusCode) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(json!(null));
    if status.is_success() {
        (body["result"]["data"].clone(), status)
    } else {
        (body, status)
    }
}

pub fn test_config(database_url: String) -> Config {
    Config {
        database_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        admin_pin: TEST_PIN.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        secure_cookies: false,
        max_body_size: 1_048_576,
        trusted_proxies: vec![],
        ticket_validity_hours: 12,
        event_name: "Reserva Solar".to_string(),
        log_level: "warn".to_string(),
        marketing: MarketingConfig::default(),
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!("portaria_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let app = portaria::build_app(pool.clone(), test_config(test_url));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
