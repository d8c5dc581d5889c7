//! Token flow against real Postgres and Redis.
//!
//! Skipped unless both `DATABASE_URL` and `REDIS_URL` are set.

use catalog_service::auth::build_token_service;
use catalog_service::config::{AuthSettings, DatabaseSettings, RedisSettings, Settings};
use catalog_service::db::{schema, users};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use token_security::{AuthError, AuthUser, TokenService};
use uuid::Uuid;

async fn setup() -> Option<(PgPool, TokenService)> {
    let (Ok(database_url), Ok(redis_url)) =
        (std::env::var("DATABASE_URL"), std::env::var("REDIS_URL"))
    else {
        eprintln!("Skipping test - DATABASE_URL or REDIS_URL not set");
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test - Postgres not available: {}", e);
            return None;
        }
    };
    schema::ensure_schema(&pool).await.expect("schema");

    let settings = Settings {
        database: DatabaseSettings {
            url: database_url,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: 10,
        },
        redis: RedisSettings { url: redis_url },
        auth: AuthSettings {
            master_key: b"auth-flow-test-master-key".to_vec(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 2_592_000,
        },
    };

    let service = match build_token_service(&settings, pool.clone()).await {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Skipping test - Redis not available: {}", e);
            return None;
        }
    };

    Some((pool, service))
}

async fn create_user(pool: &PgPool, marker: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("gardener_{marker}"))
    .bind(format!("gardener_{marker}@example.org"))
    .bind("$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$AAAAAAAAAAA")
    .fetch_one(pool)
    .await
    .expect("insert user")
}

#[tokio::test]
async fn access_and_refresh_flow_against_backing_stores() {
    let Some((pool, service)) = setup().await else {
        return;
    };
    let marker = Uuid::new_v4().simple().to_string();
    let user_id = create_user(&pool, &marker).await;

    let user = users::find_by_email_or_username(&pool, &format!("gardener_{marker}"))
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(user.id, user_id);
    let auth_user = AuthUser::from(&user);

    let access = service.issue_access(&auth_user).expect("issue access");
    let verified = service.verify_access(&access).await.expect("verify access");
    assert_eq!(verified.user.id, user_id);

    // Refresh rotates once, then the old token is burned in Redis.
    let refresh = service.issue_refresh(&auth_user).expect("issue refresh");
    let pair = service.refresh_pair(&refresh).await.expect("rotate");
    assert!(matches!(
        service.refresh_pair(&refresh).await,
        Err(AuthError::Revoked)
    ));

    // The replacement pair is live.
    service
        .verify_access(&pair.access)
        .await
        .expect("new access verifies");
    service.refresh_pair(&pair.refresh).await.expect("new refresh rotates");
}
