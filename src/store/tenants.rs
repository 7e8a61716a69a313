use super::models::{Project, ProjectSet, Tenant, TenantConfig, TenantsDocument};
use super::{DataStore, StoreError};

impl DataStore {
    /// Every registered tenant, active or not, in file order.
    pub async fn all_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let doc: Option<TenantsDocument> = self.read(&self.tenants_path()).await?;
        Ok(doc.map(|d| d.tenants).unwrap_or_default())
    }

    pub async fn active_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let mut tenants = self.all_tenants().await?;
        tenants.retain(|t| t.active);
        Ok(tenants)
    }

    /// First tenant whose slug matches exactly.
    pub async fn tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, StoreError> {
        Ok(self.all_tenants().await?.into_iter().find(|t| t.slug == slug))
    }

    /// The tenant's project document; a tenant without a data directory has
    /// no projects.
    pub async fn tenant_projects(&self, slug: &str) -> Result<ProjectSet, StoreError> {
        if !is_path_segment(slug) {
            return Ok(ProjectSet::default());
        }
        let path = self.tenant_dir(slug).join("projects.json");
        Ok(self.read(&path).await?.unwrap_or_default())
    }

    pub async fn project_by_slug(
        &self,
        tenant_slug: &str,
        project_slug: &str,
    ) -> Result<Option<Project>, StoreError> {
        let set = self.tenant_projects(tenant_slug).await?;
        Ok(set.find(project_slug).cloned())
    }

    pub async fn tenant_config(&self, slug: &str) -> Result<TenantConfig, StoreError> {
        if !is_path_segment(slug) {
            return Ok(TenantConfig::new());
        }
        let path = self.tenant_dir(slug).join("config.json");
        Ok(self.read(&path).await?.unwrap_or_default())
    }
}

/// Slugs come straight from the URL; anything that could escape the tenant
/// directory resolves to "no data".
pub(crate) fn is_path_segment(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(['/', '\\', '\0'])
}
