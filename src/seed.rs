use tracing::info;

use crate::{
    config::Config,
    error::AppError,
    models::admin::{AdminRole, NewAdmin},
    state::DynStore,
    utils::hash::hash_password,
};

/// Creates the bootstrap `super` admin from `ADMIN_EMAIL` / `ADMIN_PASSWORD`.
///
/// Returns `true` when a new admin was inserted. An existing admin with the
/// same email is left untouched.
pub async fn seed_admin(store: &DynStore, config: &Config) -> Result<bool, AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(false);
    };

    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Ok(false);
    }

    if store.find_admin_by_email(&email).await?.is_some() {
        return Ok(false);
    }

    let admin = NewAdmin {
        email,
        password_hash: hash_password(password)?,
        name: config.admin_name.clone(),
        role: AdminRole::Super,
    };

    match store.insert_admin(admin).await {
        Ok(admin) => {
            info!(admin_id = %admin.id, email = %admin.email, "Seeded bootstrap admin");
            Ok(true)
        }
        // Another instance won the race.
        Err(crate::store::StoreError::Conflict(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;

    fn config(email: Option<&str>, password: Option<&str>) -> Config {
        Config {
            database_url: None,
            admin_jwt_secret: "admin-secret".into(),
            session_secret: "session-secret".into(),
            rust_log: "error".into(),
            port: 0,
            cors_origins: vec![],
            admin_email: email.map(str::to_string),
            admin_password: password.map(str::to_string),
            admin_name: "Admin".into(),
        }
    }

    #[tokio::test]
    async fn seeds_once() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let config = config(Some("Root@Example.com"), Some("bootstrap-pass"));

        assert!(seed_admin(&store, &config).await.unwrap());
        assert!(!seed_admin(&store, &config).await.unwrap());

        let admin = store
            .find_admin_by_email("root@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, AdminRole::Super);
        assert_eq!(admin.name, "Admin");
    }

    #[tokio::test]
    async fn skips_without_credentials() {
        let store: DynStore = Arc::new(MemoryStore::new());
        assert!(!seed_admin(&store, &config(Some("root@example.com"), None)).await.unwrap());
        assert!(!seed_admin(&store, &config(None, None)).await.unwrap());
    }
}
