/// Immutable catalogs
///
/// Plans, workflow templates and benchmark providers are fixed data. They
/// are built once at startup and shared read-only through application state.

pub mod plans;
pub mod providers;
pub mod templates;

use plans::PlanCatalog;
use providers::ProviderCatalog;
use templates::TemplateCatalog;

/// Every catalog the API serves
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub plans: PlanCatalog,
    pub templates: TemplateCatalog,
    pub providers: ProviderCatalog,
}

impl Catalogs {
    pub fn builtin() -> Self {
        Self {
            plans: PlanCatalog::builtin(),
            templates: TemplateCatalog::builtin(),
            providers: ProviderCatalog::builtin(),
        }
    }
}
