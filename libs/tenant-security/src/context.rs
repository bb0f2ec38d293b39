use crate::TenantId;

/// Identity of the tenant that queries are currently issued for.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CurrentTenant {
    id: TenantId,
    name: Option<String>,
}

impl CurrentTenant {
    pub fn new(id: impl Into<TenantId>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &TenantId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl From<TenantId> for CurrentTenant {
    fn from(id: TenantId) -> Self {
        Self::new(id)
    }
}

impl From<&str> for CurrentTenant {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Caller-owned holder of the "current tenant".
///
/// A single slot: setting a tenant overwrites the previous one, there is no
/// stack of scopes. The context is a plain value passed by reference into
/// every data-access call; changing it requires `&mut`, so a unit of work
/// cannot switch tenants while one of its queries still borrows the context.
///
/// A fresh context has no tenant. Whether that means "no filter" or "deny
/// all" is decided by the data-access layer's policy, not here.
///
/// ```
/// use tenant_security::{CurrentTenant, TenantContext};
///
/// let mut ctx = TenantContext::new();
/// assert!(ctx.current_tenant().is_none());
///
/// ctx.set_current_tenant(CurrentTenant::new("acc1").with_name("test account 1"));
/// assert_eq!(ctx.current_tenant_id().map(|id| id.as_str()), Some("acc1"));
///
/// ctx.set_current_tenant("acc2");
/// assert_eq!(ctx.current_tenant_id().map(|id| id.as_str()), Some("acc2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantContext {
    current: Option<CurrentTenant>,
}

impl TenantContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with `tenant` already set.
    pub fn for_tenant(tenant: impl Into<CurrentTenant>) -> Self {
        Self {
            current: Some(tenant.into()),
        }
    }

    /// Replace the current tenant. The previous value is dropped.
    pub fn set_current_tenant(&mut self, tenant: impl Into<CurrentTenant>) {
        self.current = Some(tenant.into());
    }

    #[must_use]
    pub fn current_tenant(&self) -> Option<&CurrentTenant> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn current_tenant_id(&self) -> Option<&TenantId> {
        self.current.as_ref().map(CurrentTenant::id)
    }

    /// Forget the current tenant.
    pub fn clear(&mut self) {
        self.current = None;
    }
}
