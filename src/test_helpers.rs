use std::{sync::Arc, time::Duration};

use axum::Router;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{
    auth::{TokenIssuer, password::hash_password, providers::LocalAuthProvider},
    config::AuthConfig,
    db::entities::{admin, device, environment, user, user_environment},
    routes::app,
    services::ServiceContext,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn ts() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("offset should be valid")
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("timestamp should be valid")
}

fn digits(seed: u128, count: usize) -> String {
    format!("{:0>width$}", seed % 10u128.pow(count as u32), width = count)
}

pub fn admin_model(email: &str, super_admin: bool) -> admin::Model {
    admin::Model {
        id: Uuid::new_v4(),
        created_at: ts(),
        updated_at: ts(),
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        super_admin,
    }
}

pub fn admin_with_password(email: &str, password: &str, super_admin: bool) -> admin::Model {
    admin::Model {
        password_hash: hash_password(password).expect("hash should succeed"),
        ..admin_model(email, super_admin)
    }
}

/// A valid user whose cpf and phone number are derived from a fresh id.
pub fn user_model(email: &str) -> user::Model {
    let id = Uuid::new_v4();
    let seed = id.as_u128();
    let cpf = digits(seed, 11);
    let phone = digits(seed >> 40, 8);
    let name = email.split('@').next().unwrap_or(email).to_string();

    user::Model {
        id,
        created_at: ts(),
        updated_at: ts(),
        name_unaccent: crate::text::fold(&name),
        name,
        email: email.to_string(),
        cpf: format!("{}.{}.{}-{}", &cpf[0..3], &cpf[3..6], &cpf[6..9], &cpf[9..11]),
        phone_number: format!("(11) 9{}-{}", &phone[0..4], &phone[4..8]),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).expect("date should be valid"),
        status: "active".to_string(),
        registered_by_admin_id: Uuid::new_v4(),
        last_accessed_environment_id: None,
        last_access_time: None,
    }
}

pub fn environment_model(name: &str) -> environment::Model {
    environment::Model {
        id: Uuid::new_v4(),
        created_at: ts(),
        updated_at: ts(),
        name: name.to_string(),
        name_unaccent: crate::text::fold(name),
        creator_admin_id: Uuid::new_v4(),
        last_accessed_by_user_id: None,
        last_access_time: None,
    }
}

pub fn device_model(serial_number: &str, environment_id: Option<Uuid>) -> device::Model {
    device::Model {
        id: Uuid::new_v4(),
        created_at: ts(),
        updated_at: ts(),
        serial_number: serial_number.to_string(),
        environment_id,
        creator_admin_id: Uuid::new_v4(),
    }
}

pub fn link_model(user_id: Uuid, environment_id: Uuid) -> user_environment::Model {
    user_environment::Model {
        user_id,
        environment_id,
        created_at: ts(),
    }
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        access_token_ttl_minutes: 30,
        admin_email: "root@example.com".to_string(),
        admin_password: "root-password".to_string(),
    }
}

pub fn test_issuer() -> TokenIssuer {
    TokenIssuer::new(TEST_JWT_SECRET.as_bytes(), Duration::from_secs(30 * 60))
}

/// Full application over `db`, wired exactly as the binary wires it.
pub fn test_app(db: DatabaseConnection) -> Router {
    let provider = LocalAuthProvider::new(ServiceContext::new(&db).admin(), test_issuer());
    let state = AppState::new(db, Arc::new(provider));
    app(state)
}

pub fn bearer(email: &str) -> String {
    let token = test_issuer().issue(email).expect("token should encode");
    format!("Bearer {token}")
}
