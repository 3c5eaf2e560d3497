use pathguard_auth::{Identity, Permission, Principal};

/// Authenticated caller for a request.
///
/// Inserted into request extensions by the auth middleware; handlers take it
/// with `Extension<PrincipalContext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn identity(&self) -> &Identity {
        &self.principal.identity
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.principal.permissions
    }

    pub fn into_inner(self) -> Principal {
        self.principal
    }
}
