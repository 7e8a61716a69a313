use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Role carried by a user record and copied into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// Any role name other than `admin` reads as a regular user.
    #[default]
    #[serde(other)]
    User,
}

impl Role {
    /// Form values other than `admin` fall back to a regular user.
    pub fn from_form(value: &str) -> Self {
        match value.trim() {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "UserRecord")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: Role,
    pub tenant_access: Vec<String>,
    pub default_tenant: Option<String>,
    pub active: bool,
    /// Keys this service does not interpret, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `users.json` entry as found on disk. Older records carry the access list
/// under `tenants`, sometimes next to `tenant_access`.
#[derive(Deserialize)]
struct UserRecord {
    id: String,
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    tenant_access: Option<Vec<String>>,
    #[serde(default)]
    tenants: Option<Vec<String>>,
    #[serde(default, deserialize_with = "empty_as_none")]
    default_tenant: Option<String>,
    #[serde(default = "default_true")]
    active: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
            password: record.password,
            role: record.role,
            tenant_access: record
                .tenant_access
                .or(record.tenants)
                .unwrap_or_default(),
            default_tenant: record.default_tenant,
            active: record.active,
            extra: record.extra,
        }
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub slug: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Contents of `tenants/<slug>/projects.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSet {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectSet {
    pub fn find(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.slug == slug)
    }

    /// Some tenants keep their company profile in the projects document
    /// instead of a separate config file.
    pub fn has_company_profile(&self) -> bool {
        self.extra.contains_key("company")
    }
}

/// Contents of `platform.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub platform: Map<String, Value>,
    #[serde(default)]
    pub tenants: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            platform: Map::new(),
            tenants: Vec::new(),
            extra: Map::new(),
        }
    }
}

pub type TenantConfig = Map<String, Value>;

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct UsersDocument {
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct TenantsDocument {
    #[serde(default)]
    pub tenants: Vec<Tenant>,
}

fn default_true() -> bool {
    true
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_defaults_fill_missing_fields() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "a@example.com"
        }))
        .unwrap();

        assert_eq!(user.role, Role::User);
        assert!(user.active);
        assert!(user.tenant_access.is_empty());
        assert_eq!(user.default_tenant, None);
        assert_eq!(user.password, None);
    }

    #[test]
    fn legacy_tenants_key_reads_as_tenant_access() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "a@example.com",
            "tenants": ["acme", "nobles"],
            "default_tenant": ""
        }))
        .unwrap();

        assert_eq!(user.tenant_access, vec!["acme", "nobles"]);
        assert_eq!(user.default_tenant, None);
    }

    #[test]
    fn tenant_access_wins_over_legacy_tenants() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "a@example.com",
            "tenant_access": ["acme"],
            "tenants": ["acme", "nobles"]
        }))
        .unwrap();
        assert_eq!(user.tenant_access, vec!["acme"]);

        let written = serde_json::to_value(&user).unwrap();
        assert_eq!(written["tenant_access"], json!(["acme"]));
        assert!(written.get("tenants").is_none());
    }

    #[test]
    fn unrecognised_role_reads_as_user() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "a@example.com",
            "role": "editor"
        }))
        .unwrap();
        assert_eq!(user.role, Role::User);
        assert!(!user.is_admin());
    }

    #[test]
    fn unknown_user_keys_survive_a_rewrite() {
        let raw = json!({
            "id": "u1",
            "email": "a@example.com",
            "name": "Amal",
            "role": "admin",
            "tenant_access": ["acme"],
            "default_tenant": "acme",
            "active": false,
            "phone": "+966 5"
        });
        let user: User = serde_json::from_value(raw.clone()).unwrap();
        assert!(user.is_admin());

        let written = serde_json::to_value(&user).unwrap();
        assert_eq!(written, raw);
    }

    #[test]
    fn project_set_keeps_company_profile() {
        let set: ProjectSet = serde_json::from_value(json!({
            "company": {"name": "نوبلز"},
            "projects": [{"slug": "launch", "title": "Launch"}]
        }))
        .unwrap();

        assert!(set.has_company_profile());
        assert_eq!(set.find("launch").map(|p| p.slug.as_str()), Some("launch"));
        assert!(set.find("Launch").is_none());
    }

    #[test]
    fn role_from_form_defaults_to_user() {
        assert_eq!(Role::from_form("admin"), Role::Admin);
        assert_eq!(Role::from_form("Admin"), Role::User);
        assert_eq!(Role::from_form(""), Role::User);
    }
}
