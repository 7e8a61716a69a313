use uuid::Uuid;

use super::models::{Role, User, UsersDocument};
use super::{DataStore, StoreError};

/// Why a local password check failed. The guard treats both the same; the
/// login page words them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    /// No user with that email, or the account is disabled.
    UnknownOrInactive,
    WrongPassword,
}

/// Input for creating a user from the admin dashboard.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub default_tenant: Option<String>,
    pub tenant_access: Vec<String>,
}

/// Fields overwritten by an admin edit.
#[derive(Debug, Clone, Default)]
pub struct UserEdit {
    pub name: String,
    pub email: String,
    pub default_tenant: Option<String>,
    pub tenant_access: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddUserOutcome {
    Added(User),
    MissingFields,
    DuplicateEmail,
}

impl DataStore {
    pub async fn load_users(&self) -> Result<Vec<User>, StoreError> {
        let doc: Option<UsersDocument> = self.read(&self.users_path()).await?;
        Ok(doc.map(|d| d.users).unwrap_or_default())
    }

    pub async fn save_users(&self, users: Vec<User>) -> Result<(), StoreError> {
        self.write(&self.users_path(), &UsersDocument { users }).await
    }

    /// Case-insensitive email lookup; first match wins.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let needle = email.to_lowercase();
        Ok(self
            .load_users()
            .await?
            .into_iter()
            .find(|u| u.email.to_lowercase() == needle))
    }

    /// Local credential check: the user must exist, be active, and have a
    /// stored password equal to `password`.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Result<User, CredentialFailure>, StoreError> {
        let user = match self.find_user_by_email(email).await? {
            Some(user) if user.active => user,
            _ => return Ok(Err(CredentialFailure::UnknownOrInactive)),
        };

        if user.password.as_deref() == Some(password) {
            Ok(Ok(user))
        } else {
            Ok(Err(CredentialFailure::WrongPassword))
        }
    }

    /// `Some(user)` iff the credentials are valid.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, StoreError> {
        Ok(self.verify_credentials(email, password).await?.ok())
    }

    /// Append a new user. Uniqueness compares the stored email verbatim.
    pub async fn add_user(&self, new_user: NewUser) -> Result<AddUserOutcome, StoreError> {
        if new_user.name.is_empty() || new_user.email.is_empty() {
            return Ok(AddUserOutcome::MissingFields);
        }

        let mut users = self.load_users().await?;
        if users.iter().any(|u| u.email == new_user.email) {
            return Ok(AddUserOutcome::DuplicateEmail);
        }

        let user = User {
            id: short_id(),
            email: new_user.email,
            name: new_user.name,
            password: None,
            role: new_user.role,
            tenant_access: new_user.tenant_access,
            default_tenant: new_user.default_tenant,
            active: true,
            extra: Default::default(),
        };
        users.push(user.clone());
        self.save_users(users).await?;

        tracing::info!(user_id = %user.id, email = %user.email, "user added");
        Ok(AddUserOutcome::Added(user))
    }

    /// Overwrite the editable fields of the user with `id`. The document is
    /// rewritten even when no user matches.
    pub async fn edit_user(&self, id: &str, edit: UserEdit) -> Result<bool, StoreError> {
        let mut users = self.load_users().await?;
        let found = match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.name = edit.name;
                user.email = edit.email;
                user.default_tenant = edit.default_tenant;
                user.tenant_access = edit.tenant_access;
                true
            }
            None => false,
        };
        self.save_users(users).await?;
        Ok(found)
    }

    /// Flip `active`, returning the updated user when one matched.
    pub async fn toggle_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let mut users = self.load_users().await?;
        let toggled = users.iter_mut().find(|u| u.id == id).map(|user| {
            user.active = !user.active;
            user.clone()
        });
        self.save_users(users).await?;
        Ok(toggled)
    }

    /// Remove every user with `id`; an unknown id leaves the list as is.
    pub async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        let mut users = self.load_users().await?;
        users.retain(|u| u.id != id);
        self.save_users(users).await
    }
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().to_string();
    id.truncate(8);
    id
}
