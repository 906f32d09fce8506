//! Authorization hooks guarding mutating operations.
//!
//! Handlers only ask an [`AuthorizationPolicy`] whether a caller-supplied
//! credential is acceptable, so the scheme can change without touching them.

/// Decides whether a raw credential grants access to protected operations.
pub trait AuthorizationPolicy: Send + Sync {
    fn authorize(&self, credential: Option<&str>) -> bool;
}

/// Any `Fn(Option<&str>) -> bool` works as a policy.
impl<F> AuthorizationPolicy for F
where
    F: Fn(Option<&str>) -> bool + Send + Sync,
{
    fn authorize(&self, credential: Option<&str>) -> bool {
        self(credential)
    }
}

/// Single static secret compared for exact equality.
///
/// No hashing, no identity, no expiry.
#[derive(Debug, Clone)]
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl AuthorizationPolicy for SharedSecret {
    fn authorize(&self, credential: Option<&str>) -> bool {
        let granted = credential == Some(self.secret.as_str());
        if !granted {
            tracing::debug!(
                target: "bookshop-authz",
                present = credential.is_some(),
                "shared secret mismatch"
            );
        }
        granted
    }
}
