//! Integration tests against a live PostgreSQL database.
//!
//! Opt-in: set `AUTHSTORE_TEST_DSN` to a connection string to run these,
//! e.g. `AUTHSTORE_TEST_DSN=postgres://localhost/authstore_test cargo test`.
//! Every id and token is uuid-suffixed so tests can share one database and
//! run in parallel.

use serde_json::json;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use authstore::types::{AccessData, AuthorizeData, Client, ClientFilter};
use authstore::{AdminStorage, OAuthStorage, StoreError};
use authstore_postgres::{PgOAuthStore, StoreConfig, schema};

static SCHEMA_READY: tokio::sync::OnceCell<()> = tokio::sync::OnceCell::const_new();

async fn test_store() -> Option<PgOAuthStore> {
    let Ok(dsn) = std::env::var("AUTHSTORE_TEST_DSN") else {
        eprintln!("skipping postgres test (set AUTHSTORE_TEST_DSN to run)");
        return None;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let store = PgOAuthStore::connect(&StoreConfig::new(dsn))
        .await
        .expect("connect to test database");
    // Tests run in parallel; bootstrap the schema once per process.
    SCHEMA_READY
        .get_or_init(|| async {
            schema::create_tables_if_not_exists(store.pool())
                .await
                .expect("bootstrap schema");
        })
        .await;
    Some(store)
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

fn sample_client() -> Client {
    Client::new(unique("client"), "secret", "http://localhost:3000/callback")
}

fn sample_authorize(client: &Client) -> AuthorizeData {
    AuthorizeData {
        code: unique("code"),
        client: client.clone(),
        expires_in: 600,
        scope: "basic".into(),
        redirect_uri: client.redirect_uri.clone(),
        state: "xyz".into(),
        created_at: OffsetDateTime::now_utc(),
        user_data: json!({"uid": "alice"}),
    }
}

fn sample_access(client: &Client) -> AccessData {
    AccessData {
        access_token: unique("at"),
        client: client.clone(),
        authorize_data: None,
        previous: None,
        refresh_token: None,
        expires_in: 3600,
        scope: "basic".into(),
        redirect_uri: client.redirect_uri.clone(),
        created_at: OffsetDateTime::now_utc(),
        user_data: json!({"uid": "alice"}),
        frozen: false,
    }
}

// =============================================================================
// Clients
// =============================================================================

#[tokio::test]
async fn client_round_trip_and_upsert() {
    let Some(store) = test_store().await else {
        return;
    };

    let mut client = sample_client();
    store.save_client(&client).await.unwrap();

    let loaded = store.get_client(&client.id).await.unwrap();
    assert_eq!(loaded.secret, "secret");
    assert_eq!(loaded.redirect_uri, client.redirect_uri);
    assert_eq!(loaded.meta.name, client.meta.name);

    // Second save with the same id updates in place.
    client.secret = "rotated".into();
    client.meta.name = "My App".into();
    store.save_client(&client).await.unwrap();

    let reloaded = store.get_client(&client.id).await.unwrap();
    assert_eq!(reloaded.secret, "rotated");
    assert_eq!(reloaded.meta.name, "My App");
    // Creation time survives the update.
    assert_eq!(reloaded.created_at, loaded.created_at);

    store.remove_client(&client.id).await.unwrap();
    let err = store.get_client(&client.id).await.unwrap_err();
    assert!(err.is_not_found());

    // Removal is idempotent.
    store.remove_client(&client.id).await.unwrap();
}

#[tokio::test]
async fn client_validation_rejects_before_touching_the_database() {
    let Some(store) = test_store().await else {
        return;
    };

    let mut client = sample_client();
    client.secret = String::new();
    let err = store.save_client(&client).await.unwrap_err();
    assert!(err.is_value_error());
    assert!(store.get_client(&client.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn client_list_pages_and_counts() {
    let Some(store) = test_store().await else {
        return;
    };

    for _ in 0..3 {
        store.save_client(&sample_client()).await.unwrap();
    }

    let filter = ClientFilter { page: 1, limit: 2 };
    let (page, total) = store.list_clients(&filter).await.unwrap();
    assert_eq!(page.len(), 2);
    assert!(total >= 3);

    // Out-of-range limits are rejected before the query runs.
    let bad = ClientFilter {
        page: 1,
        limit: 100_000,
    };
    assert!(store.list_clients(&bad).await.unwrap_err().is_value_error());
}

// =============================================================================
// Authorization codes
// =============================================================================

#[tokio::test]
async fn authorize_round_trip() {
    let Some(store) = test_store().await else {
        return;
    };

    let client = sample_client();
    store.save_client(&client).await.unwrap();

    let data = sample_authorize(&client);
    store.save_authorize(&data).await.unwrap();

    let loaded = store.load_authorize(&data.code).await.unwrap();
    assert_eq!(loaded.client.id, client.id);
    assert_eq!(loaded.scope, "basic");
    assert_eq!(loaded.state, "xyz");
    assert_eq!(loaded.user_data, json!({"uid": "alice"}));

    store.remove_authorize(&data.code).await.unwrap();
    assert!(
        store
            .load_authorize(&data.code)
            .await
            .unwrap_err()
            .is_not_found()
    );

    // An empty code is a no-op, not an error.
    store.remove_authorize("").await.unwrap();
}

#[tokio::test]
async fn authorize_expired_is_distinct_from_missing() {
    let Some(store) = test_store().await else {
        return;
    };

    let client = sample_client();
    store.save_client(&client).await.unwrap();

    let mut data = sample_authorize(&client);
    data.created_at = OffsetDateTime::now_utc() - Duration::seconds(3600);
    data.expires_in = 60;
    store.save_authorize(&data).await.unwrap();

    let err = store.load_authorize(&data.code).await.unwrap_err();
    assert!(err.is_expired());
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn authorize_rejects_non_object_user_data() {
    let Some(store) = test_store().await else {
        return;
    };

    let client = sample_client();
    store.save_client(&client).await.unwrap();

    let mut data = sample_authorize(&client);
    data.user_data = json!("just a string");
    let err = store.save_authorize(&data).await.unwrap_err();
    assert!(err.is_value_error());

    // Null normalizes to an empty object instead of failing.
    data.user_data = serde_json::Value::Null;
    store.save_authorize(&data).await.unwrap();
    let loaded = store.load_authorize(&data.code).await.unwrap();
    assert_eq!(loaded.user_data, json!({}));
}

// =============================================================================
// Access tokens
// =============================================================================

#[tokio::test]
async fn access_save_is_idempotent_on_token() {
    let Some(store) = test_store().await else {
        return;
    };

    let client = sample_client();
    store.save_client(&client).await.unwrap();

    let mut access = sample_access(&client);
    access.scope = "basic".into();
    store.save_access(&access).await.unwrap();

    // A second save of the same token succeeds without overwriting.
    access.scope = "everything".into();
    store.save_access(&access).await.unwrap();

    let loaded = store.load_access(&access.access_token).await.unwrap();
    assert_eq!(loaded.scope, "basic");
}

#[tokio::test]
async fn access_chain_loads_with_lineage() {
    let Some(store) = test_store().await else {
        return;
    };

    let client = sample_client();
    store.save_client(&client).await.unwrap();

    let authorize = sample_authorize(&client);
    store.save_authorize(&authorize).await.unwrap();

    let mut first = sample_access(&client);
    first.authorize_data = Some(authorize.clone());
    first.refresh_token = Some(unique("rt"));
    store.save_access(&first).await.unwrap();

    let mut second = sample_access(&client);
    second.previous = Some(Box::new(first.clone()));
    second.refresh_token = Some(unique("rt"));
    store.save_access(&second).await.unwrap();

    let loaded = store.load_access(&second.access_token).await.unwrap();
    assert_eq!(loaded.client.id, client.id);
    let prev = loaded.previous.as_deref().expect("previous loads");
    assert_eq!(prev.access_token, first.access_token);
    assert_eq!(
        prev.authorize_data.as_ref().map(|a| a.code.as_str()),
        Some(authorize.code.as_str())
    );
}

#[tokio::test]
async fn access_chain_tolerates_pruned_links() {
    let Some(store) = test_store().await else {
        return;
    };

    let client = sample_client();
    store.save_client(&client).await.unwrap();

    let first = sample_access(&client);
    store.save_access(&first).await.unwrap();

    let mut second = sample_access(&client);
    second.previous = Some(Box::new(first.clone()));
    store.save_access(&second).await.unwrap();

    store.remove_access(&first.access_token).await.unwrap();

    // The dangling pointer loads as no predecessor, not as an error.
    let loaded = store.load_access(&second.access_token).await.unwrap();
    assert!(loaded.previous.is_none());
}

#[tokio::test]
async fn access_chain_cycle_is_detected() {
    let Some(store) = test_store().await else {
        return;
    };

    let client = sample_client();
    store.save_client(&client).await.unwrap();

    let a = sample_access(&client);
    store.save_access(&a).await.unwrap();
    let mut b = sample_access(&client);
    b.previous = Some(Box::new(a.clone()));
    store.save_access(&b).await.unwrap();

    // Force a loop directly; the API never writes one.
    sqlx_core::query::query("UPDATE oauth_access SET previous = $1 WHERE access_token = $2")
        .bind(&b.access_token)
        .bind(&a.access_token)
        .execute(store.pool())
        .await
        .unwrap();

    let err = store.load_access(&b.access_token).await.unwrap_err();
    assert!(matches!(err, StoreError::ChainCycle { .. }));
}

// =============================================================================
// Refresh tokens
// =============================================================================

#[tokio::test]
async fn refresh_resolves_and_repoints_on_rotation() {
    let Some(store) = test_store().await else {
        return;
    };

    let client = sample_client();
    store.save_client(&client).await.unwrap();

    let refresh = unique("rt");
    let mut first = sample_access(&client);
    first.refresh_token = Some(refresh.clone());
    store.save_access(&first).await.unwrap();

    let loaded = store.load_refresh(&refresh).await.unwrap();
    assert_eq!(loaded.access_token, first.access_token);

    // Rotation: a new access token reuses the refresh token, which now
    // points at the successor.
    let mut second = sample_access(&client);
    second.previous = Some(Box::new(first.clone()));
    second.refresh_token = Some(refresh.clone());
    store.save_access(&second).await.unwrap();

    let loaded = store.load_refresh(&refresh).await.unwrap();
    assert_eq!(loaded.access_token, second.access_token);
    assert_eq!(loaded.previous_token(), Some(first.access_token.as_str()));

    // Removing the index entry leaves the access row intact.
    store.remove_refresh(&refresh).await.unwrap();
    assert!(store.load_refresh(&refresh).await.unwrap_err().is_not_found());
    store.load_access(&second.access_token).await.unwrap();
}

// =============================================================================
// Consent and scopes
// =============================================================================

#[tokio::test]
async fn consent_round_trip() {
    let Some(store) = test_store().await else {
        return;
    };

    let client_id = unique("client");
    let username = unique("user");

    assert!(!store.is_authorized(&client_id, &username).await.unwrap());

    store.save_authorized(&client_id, &username).await.unwrap();
    assert!(store.is_authorized(&client_id, &username).await.unwrap());

    // Repeated grants are idempotent.
    store.save_authorized(&client_id, &username).await.unwrap();
    assert!(store.is_authorized(&client_id, &username).await.unwrap());
}

#[tokio::test]
async fn scopes_list_in_name_order() {
    let Some(store) = test_store().await else {
        return;
    };

    let a = unique("aaa-scope");
    let b = unique("zzz-scope");
    for (name, is_default) in [(&b, false), (&a, true)] {
        sqlx_core::query::query(
            r#"
            INSERT INTO oauth_scope (name, label, description, is_default)
            VALUES ($1, $2, '', $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(name)
        .bind(is_default)
        .execute(store.pool())
        .await
        .unwrap();
    }

    let scopes = store.list_scopes().await.unwrap();
    let pos_a = scopes.iter().position(|s| s.name == a).unwrap();
    let pos_b = scopes.iter().position(|s| s.name == b).unwrap();
    assert!(pos_a < pos_b);
    assert!(scopes[pos_a].is_default);
}

// =============================================================================
// End-to-end grant flow
// =============================================================================

#[tokio::test]
async fn authorization_code_flow_end_to_end() {
    let Some(store) = test_store().await else {
        return;
    };

    // Registration.
    let client = sample_client();
    store.save_client(&client).await.unwrap();

    // Authorization grant.
    let authorize = sample_authorize(&client);
    store.save_authorize(&authorize).await.unwrap();

    // Code exchange: issue the first token, consume the code.
    let refresh = unique("rt");
    let mut first = sample_access(&client);
    first.authorize_data = Some(store.load_authorize(&authorize.code).await.unwrap());
    first.refresh_token = Some(refresh.clone());
    store.save_access(&first).await.unwrap();
    store.remove_authorize(&authorize.code).await.unwrap();

    // The access row outlives the consumed code; its link degrades to empty.
    let reloaded = store.load_access(&first.access_token).await.unwrap();
    assert!(reloaded.authorize_data.is_none());

    // Refresh grant: rotate the token, retire the predecessor.
    let old = store.load_refresh(&refresh).await.unwrap();
    let mut second = sample_access(&client);
    second.previous = Some(Box::new(old.clone()));
    second.refresh_token = Some(refresh.clone());
    store.save_access(&second).await.unwrap();
    store.remove_access(&old.access_token).await.unwrap();

    let current = store.load_refresh(&refresh).await.unwrap();
    assert_eq!(current.access_token, second.access_token);
    // The consumed code and the retired token are gone; the pruned lineage
    // loads as empty, not as an error.
    assert!(current.previous.is_none());
    assert!(current.authorize_data.is_none());
    assert!(
        store
            .load_access(&old.access_token)
            .await
            .unwrap_err()
            .is_not_found()
    );
}
