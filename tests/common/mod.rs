use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    middleware, Router,
};
use chrono::{DateTime, Utc};
use fake::faker::address::en::{BuildingNumber, StreetName};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use stockroom_api::{
    auth::{self, AuthService},
    config::AppConfig,
    db,
    entities::{inventory_item, inventory_transaction, supplier, user},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

const TEST_JWT_SECRET: &str =
    "integration-test-secret-0123456789-abcdefghijklmnopqrstuvwxyz-ABCDEFGH";

/// A seeded account plus a valid access token for it.
///
/// Not every test binary touches every field, hence the allow.
#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub token: String,
}

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub staff: TestUser,
    pub clerk: TestUser,
    auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("stockroom_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 5;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(
            auth::AuthConfig::from(&cfg),
            db_arc.clone(),
        ));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));

        let state = AppState {
            db: db_arc.clone(),
            config: cfg.clone(),
            event_sender,
            services,
        };

        let staff = seed_user(&db_arc, &auth_service, "admin", "Adm1n-Test-Pass", true).await;
        let clerk = seed_user(&db_arc, &auth_service, "clerk", "Cl3rk-Test-Pass", false).await;

        let router = Router::new()
            .nest("/api/v1", stockroom_api::api_v1_routes())
            .nest("/auth", auth::auth_routes().with_state(auth_service.clone()))
            // Auth middleware reads the service from request extensions
            .layer(middleware::from_fn_with_state(
                auth_service.clone(),
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            staff,
            clerk,
            auth_service,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Access the auth service used by the test application.
    #[allow(dead_code)]
    pub fn auth_service(&self) -> Arc<AuthService> {
        self.auth_service.clone()
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for requests authenticated as the staff user.
    #[allow(dead_code)]
    pub async fn request_as_staff(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(&self.staff.token))
            .await
    }

    /// Convenience helper for requests authenticated as the regular clerk.
    #[allow(dead_code)]
    pub async fn request_as_clerk(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(&self.clerk.token))
            .await
    }

    /// Insert a supplier row directly, bypassing the HTTP surface.
    ///
    /// Only the name is controlled by the caller; contact fields are filled
    /// with generated data since no test asserts on them.
    #[allow(dead_code)]
    pub async fn seed_supplier(&self, name: &str) -> supplier::Model {
        supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            contact_person: Set(Name().fake::<String>()),
            email: Set(SafeEmail().fake::<String>()),
            phone: Set(PhoneNumber().fake::<String>()),
            address: Set(format!(
                "{} {}",
                BuildingNumber().fake::<String>(),
                StreetName().fake::<String>()
            )),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed supplier")
    }

    /// Insert an inventory item row directly, bypassing the HTTP surface.
    #[allow(dead_code)]
    pub async fn seed_item(
        &self,
        name: &str,
        sku: &str,
        quantity: i32,
        price: Decimal,
        threshold: i32,
        supplier_id: Option<Uuid>,
    ) -> inventory_item::Model {
        inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            sku: Set(sku.to_string()),
            description: Set(String::new()),
            quantity: Set(quantity),
            price: Set(price),
            supplier_id: Set(supplier_id),
            threshold: Set(threshold),
            expiration_date: Set(None),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed inventory item")
    }

    /// Insert a transaction row with a controlled creation timestamp.
    #[allow(dead_code)]
    pub async fn seed_transaction(
        &self,
        item_id: Uuid,
        transaction_type: &str,
        quantity: i32,
        user_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> inventory_transaction::Model {
        inventory_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_id: Set(item_id),
            transaction_type: Set(transaction_type.to_string()),
            quantity: Set(quantity),
            transaction_date: Set(created_at),
            user_id: Set(user_id),
            notes: Set(String::new()),
            created_at: Set(created_at),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed transaction")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

async fn seed_user(
    db: &Arc<sea_orm::DatabaseConnection>,
    auth_service: &Arc<AuthService>,
    username: &str,
    password: &str,
    is_staff: bool,
) -> TestUser {
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set(auth::hash_password(password).expect("hash test password")),
        is_staff: Set(is_staff),
        created_at: Set(Utc::now()),
    }
    .insert(db.as_ref())
    .await
    .expect("seed user");

    let tokens = auth_service
        .generate_token(&model)
        .await
        .expect("issue test token");

    TestUser {
        id: model.id,
        username: username.to_string(),
        password: password.to_string(),
        token: tokens.access_token,
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// Read a response body as a UTF-8 string.
#[allow(dead_code)]
pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    String::from_utf8(bytes.to_vec()).expect("response body should be UTF-8")
}
