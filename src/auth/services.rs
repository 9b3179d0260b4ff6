use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use super::{
    claims::Claims,
    dto::{LoginRequest, PublicUser, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_password_blocking},
    repo::UserStore,
    repo_types::User,
};
use crate::error::{AppError, StoreError};

pub const MIN_PASSWORD_LEN: usize = 6;

const EMAIL_IN_USE: &str = "Email already in use";
const BAD_CREDENTIALS: &str = "Email or password incorrect";

/// Identity plus a freshly issued token.
#[derive(Debug)]
pub struct AuthOutcome {
    pub user: PublicUser,
    pub token: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(users, keys, req))]
pub async fn register(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> Result<AuthOutcome, AppError> {
    let email = normalize_email(req.email.as_deref().unwrap_or_default());
    let password = req.password.unwrap_or_default();
    let pseudo = req.pseudo.as_deref().unwrap_or_default().trim();

    if email.is_empty() || password.is_empty() || pseudo.is_empty() {
        return Err(AppError::Validation(
            "All fields are required (email, password, pseudo)".into(),
        ));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict(EMAIL_IN_USE.into()));
    }

    let hash = hash_password_blocking(password).await?;

    // The pre-check above can race; the store constraint is authoritative.
    let user = match users.create(&email, &hash, pseudo).await {
        Ok(u) => u,
        Err(StoreError::UniqueViolation(_)) => {
            warn!(email = %email, "email registered concurrently");
            return Err(AppError::Conflict(EMAIL_IN_USE.into()));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(e.into());
        }
    };

    let token = keys.sign(user.id, &user.email)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthOutcome {
        user: user.into(),
        token,
    })
}

#[instrument(skip(users, keys, req))]
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<AuthOutcome, AppError> {
    let email = normalize_email(req.email.as_deref().unwrap_or_default());
    let password = req.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation("Email and password are required".into()));
    }

    let Some(user) = users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let token = keys.sign(user.id, &user.email)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthOutcome {
        user: user.into(),
        token,
    })
}

/// Loads the full profile behind verified claims.
pub async fn get_self(users: &dyn UserStore, claims: &Claims) -> Result<User, AppError> {
    users.find_by_id(claims.id).await?.ok_or_else(|| {
        warn!(user_id = %claims.id, "token subject no longer exists");
        AppError::NotFound("User not found".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{jwt::test_keys, password::verify_password, repo::MemoryUserStore};
    use async_trait::async_trait;
    use uuid::Uuid;

    fn register_req(email: &str, password: &str, pseudo: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.into()),
            password: Some(password.into()),
            pseudo: Some(pseudo.into()),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ash@pokemon.com"));
        assert!(!is_valid_email("ash@pokemon"));
        assert!(!is_valid_email("ash pokemon.com"));
    }

    #[tokio::test]
    async fn register_issues_token_for_new_identity() {
        let store = MemoryUserStore::new();
        let keys = test_keys();

        let a = register(&store, &keys, register_req("a@x.com", "secret1", "A"))
            .await
            .unwrap();
        let b = register(&store, &keys, register_req("b@x.com", "secret2", "B"))
            .await
            .unwrap();

        assert_ne!(a.user.id, b.user.id);
        assert_eq!(keys.verify(&a.token).unwrap().id, a.user.id);
        assert_eq!(keys.verify(&b.token).unwrap().id, b.user.id);
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let store = MemoryUserStore::new();
        let out = register(&store, &test_keys(), register_req("a@x.com", "pikachu123", "A"))
            .await
            .unwrap();
        let stored = store.find_by_id(out.user.id).await.unwrap().unwrap();
        assert!(!stored.password_hash.is_empty());
        assert_ne!(stored.password_hash, "pikachu123");
        assert!(verify_password("pikachu123", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn register_normalizes_email_and_rejects_duplicate() {
        let store = MemoryUserStore::new();
        let keys = test_keys();

        let first = register(&store, &keys, register_req("Test@x.com", "secret1", " Sacha "))
            .await
            .unwrap();
        assert_eq!(first.user.email, "test@x.com");
        assert_eq!(first.user.pseudo, "Sacha");

        let err = register(&store, &keys, register_req("test@x.com ", "secret2", "Other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == EMAIL_IN_USE));

        let stored = store.find_by_email("test@x.com").await.unwrap().unwrap();
        assert_eq!(stored.id, first.user.id);
        assert_eq!(stored.pseudo, "Sacha");
        assert!(verify_password("secret1", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn register_requires_all_fields() {
        let store = MemoryUserStore::new();
        let keys = test_keys();
        for req in [
            register_req("", "secret1", "A"),
            register_req("a@x.com", "", "A"),
            register_req("a@x.com", "secret1", "   "),
            RegisterRequest {
                pseudo: None,
                ..register_req("a@x.com", "secret1", "A")
            },
            RegisterRequest::default(),
        ] {
            let err = register(&store, &keys, req).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m.contains("required")));
        }
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_bad_email() {
        let store = MemoryUserStore::new();
        let keys = test_keys();

        let err = register(&store, &keys, register_req("a@x.com", "12345", "A"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("at least 6")));

        let err = register(&store, &keys, register_req("not-an-email", "123456", "A"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Invalid email"));
    }

    /// Simulates a concurrent registration winning between the pre-check and the insert.
    struct RacingStore(MemoryUserStore);

    #[async_trait]
    impl UserStore for RacingStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.0.find_by_id(id).await
        }

        async fn create(
            &self,
            email: &str,
            password_hash: &str,
            pseudo: &str,
        ) -> Result<User, StoreError> {
            self.0.create(email, password_hash, pseudo).await
        }
    }

    #[tokio::test]
    async fn constraint_violation_maps_to_email_in_use() {
        let store = RacingStore(MemoryUserStore::new());
        let keys = test_keys();
        register(&store, &keys, register_req("race@x.com", "secret1", "A"))
            .await
            .unwrap();
        let err = register(&store, &keys, register_req("race@x.com", "secret2", "B"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == EMAIL_IN_USE));
    }

    #[tokio::test]
    async fn login_errors_are_indistinguishable() {
        let store = MemoryUserStore::new();
        let keys = test_keys();
        register(&store, &keys, register_req("ash@pokemon.com", "pikachu123", "Sacha"))
            .await
            .unwrap();

        let wrong_password = login(&store, &keys, login_req("ash@pokemon.com", "raichu"))
            .await
            .unwrap_err();
        let unknown_email = login(&store, &keys, login_req("gary@pokemon.com", "pikachu123"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.status_code(), unknown_email.status_code());
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.to_string(), BAD_CREDENTIALS);
    }

    #[tokio::test]
    async fn login_succeeds_with_normalized_email() {
        let store = MemoryUserStore::new();
        let keys = test_keys();
        let reg = register(&store, &keys, register_req("ash@pokemon.com", "pikachu123", "Sacha"))
            .await
            .unwrap();

        let out = login(&store, &keys, login_req("  ASH@pokemon.com", "pikachu123"))
            .await
            .unwrap();
        assert_eq!(out.user, reg.user);
        assert_eq!(keys.verify(&out.token).unwrap().id, reg.user.id);
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let store = MemoryUserStore::new();
        for req in [
            login_req("a@x.com", ""),
            LoginRequest {
                password: None,
                ..login_req("a@x.com", "secret1")
            },
        ] {
            let err = login(&store, &test_keys(), req).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m == "Email and password are required"));
        }
    }

    #[tokio::test]
    async fn get_self_reports_missing_user() {
        let store = MemoryUserStore::new();
        let keys = test_keys();
        let reg = register(&store, &keys, register_req("a@x.com", "secret1", "A"))
            .await
            .unwrap();
        let claims = keys.verify(&reg.token).unwrap();

        assert_eq!(get_self(&store, &claims).await.unwrap().email, "a@x.com");

        store.remove(reg.user.id).await;
        let err = get_self(&store, &claims).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
