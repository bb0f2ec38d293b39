/// Per-statement execution switches.
///
/// Attached to a single query; they never leak into queries built later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionOptions {
    include_all_tenants: bool,
}

impl ExecutionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that exempt the statement from tenant filtering.
    ///
    /// Meant for administrative and cross-tenant queries.
    #[must_use]
    pub fn include_all_tenants() -> Self {
        Self {
            include_all_tenants: true,
        }
    }

    #[must_use]
    pub fn with_include_all_tenants(mut self, include: bool) -> Self {
        self.include_all_tenants = include;
        self
    }

    #[must_use]
    pub fn includes_all_tenants(&self) -> bool {
        self.include_all_tenants
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn filtering_is_on_by_default() {
        assert!(!ExecutionOptions::default().includes_all_tenants());
        assert!(ExecutionOptions::include_all_tenants().includes_all_tenants());
        assert!(
            !ExecutionOptions::include_all_tenants()
                .with_include_all_tenants(false)
                .includes_all_tenants()
        );
    }
}
