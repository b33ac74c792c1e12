/*!
 * Roles, permissions and staff users.
 *
 * A role carries a set of ability-map keys. Keys are stored once in
 * `permissions` (created on demand) and linked to roles through
 * `role_permissions`.
 */

use crate::{
    auth::{
        ability::is_known_key,
        password::{hash_password, MIN_PASSWORD_LENGTH},
        ADMIN_ROLE, CUSTOMER_ROLE,
    },
    entities::{
        permission::{self, Entity as Permission},
        role::{self, Entity as Role},
        role_permission,
        user::{self, Entity as User},
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::page_index;

#[derive(Clone)]
pub struct AccessService {
    db: Arc<DatabaseConnection>,
}

impl AccessService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // Roles

    #[instrument(skip(self))]
    pub async fn create_role(&self, input: CreateRoleInput) -> Result<RoleWithPermissions, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError("role name cannot be blank".to_string()));
        }
        ensure_not_reserved(&name)?;
        let keys = normalize_permission_keys(&input.permissions)?;
        self.ensure_unique_role_name(&name, None).await?;

        let txn = self.db.begin().await?;
        let now = Utc::now();
        let role = role::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        link_permissions(&txn, role.id, &keys).await?;
        txn.commit().await?;

        info!(role_id = %role.id, role = %role.name, permissions = keys.len(), "Created role");
        Ok(RoleWithPermissions {
            role,
            permissions: keys,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_role(&self, id: Uuid) -> Result<RoleWithPermissions, ServiceError> {
        let role = Role::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Role", id))?;
        let permissions = self.permission_keys_for_role(role.id).await?;
        Ok(RoleWithPermissions { role, permissions })
    }

    #[instrument(skip(self))]
    pub async fn list_roles(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<RoleWithPermissions>, u64), ServiceError> {
        let paginator = Role::find()
            .order_by_asc(role::Column::Name)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let roles = paginator.fetch_page(page_index(page)).await?;

        let mut result = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self.permission_keys_for_role(role.id).await?;
            result.push(RoleWithPermissions { role, permissions });
        }
        Ok((result, total))
    }

    /// Updates a role; a provided permission list replaces the current one
    #[instrument(skip(self))]
    pub async fn update_role(
        &self,
        id: Uuid,
        input: UpdateRoleInput,
    ) -> Result<RoleWithPermissions, ServiceError> {
        let existing = Role::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Role", id))?;
        ensure_not_built_in(&existing)?;

        let name = input.name.map(|n| n.trim().to_string());
        if let Some(name) = name.as_deref() {
            if name.is_empty() {
                return Err(ServiceError::ValidationError("role name cannot be blank".to_string()));
            }
            ensure_not_reserved(name)?;
            if name != existing.name {
                self.ensure_unique_role_name(name, Some(id)).await?;
            }
        }
        let keys = match input.permissions.as_deref() {
            Some(keys) => Some(normalize_permission_keys(keys)?),
            None => None,
        };

        let txn = self.db.begin().await?;
        let mut active: role::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Utc::now());
        let role = active.update(&txn).await?;

        if let Some(keys) = keys.as_deref() {
            role_permission::Entity::delete_many()
                .filter(role_permission::Column::RoleId.eq(id))
                .exec(&txn)
                .await?;
            link_permissions(&txn, id, keys).await?;
        }
        txn.commit().await?;

        let permissions = self.permission_keys_for_role(id).await?;
        info!(role_id = %id, "Updated role");
        Ok(RoleWithPermissions { role, permissions })
    }

    /// Deletes a role; users holding it are left without a role
    #[instrument(skip(self))]
    pub async fn delete_role(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let role = Role::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Role", id))?;
        ensure_not_built_in(&role)?;

        User::update_many()
            .col_expr(user::Column::RoleId, Expr::value(Option::<Uuid>::None))
            .filter(user::Column::RoleId.eq(id))
            .exec(&txn)
            .await?;
        role_permission::Entity::delete_many()
            .filter(role_permission::Column::RoleId.eq(id))
            .exec(&txn)
            .await?;
        role.delete(&txn).await?;
        txn.commit().await?;

        info!(role_id = %id, "Deleted role");
        Ok(())
    }

    /// Permission keys granted by a role, sorted
    pub async fn permission_keys_for_role(&self, role_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let role = match Role::find_by_id(role_id).one(&*self.db).await? {
            Some(role) => role,
            None => return Ok(Vec::new()),
        };
        let mut keys: Vec<String> = role
            .find_related(Permission)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| p.key)
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ensure_unique_role_name(&self, name: &str, exclude_id: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = Role::find().filter(role::Column::Name.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(role::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("Role {} already exists", name)));
        }
        Ok(())
    }

    // Permissions

    #[instrument(skip(self))]
    pub async fn create_permission(
        &self,
        input: CreatePermissionInput,
    ) -> Result<permission::Model, ServiceError> {
        let key = input.key.trim().to_string();
        if !is_known_key(&key) {
            return Err(ServiceError::ValidationError(format!(
                "Unknown permission key {}",
                key
            )));
        }
        if Permission::find()
            .filter(permission::Column::Key.eq(key.as_str()))
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!("Permission {} already exists", key)));
        }

        let permission = permission::ActiveModel {
            id: Set(Uuid::new_v4()),
            key: Set(key),
            description: Set(input.description),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        info!(permission = %permission.key, "Created permission");
        Ok(permission)
    }

    #[instrument(skip(self))]
    pub async fn get_permission(&self, id: Uuid) -> Result<permission::Model, ServiceError> {
        Permission::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Permission", id))
    }

    #[instrument(skip(self))]
    pub async fn list_permissions(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<permission::Model>, u64), ServiceError> {
        let paginator = Permission::find()
            .order_by_asc(permission::Column::Key)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let permissions = paginator.fetch_page(page_index(page)).await?;
        Ok((permissions, total))
    }

    /// Only the description is editable; the key is the identity
    #[instrument(skip(self))]
    pub async fn update_permission(
        &self,
        id: Uuid,
        description: Option<String>,
    ) -> Result<permission::Model, ServiceError> {
        let existing = self.get_permission(id).await?;
        let mut active: permission::ActiveModel = existing.into();
        active.description = Set(description);
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_permission(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let existing = Permission::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Permission", id))?;
        role_permission::Entity::delete_many()
            .filter(role_permission::Column::PermissionId.eq(id))
            .exec(&txn)
            .await?;
        existing.delete(&txn).await?;
        txn.commit().await?;

        info!(permission_id = %id, "Deleted permission");
        Ok(())
    }

    // Users

    /// Creates a staff user. Only an administrator may grant the admin role.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(
        &self,
        input: CreateUserInput,
        caller_is_admin: bool,
    ) -> Result<user::Model, ServiceError> {
        let email = input.email.trim().to_lowercase();
        ensure_password_length(&input.password)?;
        self.ensure_unique_user_email(&email, None).await?;
        if let Some(role_id) = input.role_id {
            self.ensure_assignable_role(role_id, caller_is_admin).await?;
        }

        let now = Utc::now();
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            email: Set(email),
            password_hash: Set(hash_password(&input.password)?),
            role_id: Set(input.role_id),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        User::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        User::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Name of the user's role, if any
    pub async fn role_name(&self, role_id: Option<Uuid>) -> Result<Option<String>, ServiceError> {
        match role_id {
            Some(id) => Ok(Role::find_by_id(id).one(&*self.db).await?.map(|r| r.name)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<user::Model>, u64), ServiceError> {
        let mut query = User::find();
        if let Some(search) = search.as_deref() {
            query = query.filter(
                user::Column::Name
                    .contains(search)
                    .or(user::Column::Email.contains(search)),
            );
        }
        let paginator = query
            .order_by_asc(user::Column::Email)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page_index(page)).await?;
        Ok((users, total))
    }

    /// Administrator accounts can only be changed by an administrator
    #[instrument(skip(self, input))]
    pub async fn update_user(
        &self,
        id: Uuid,
        input: UpdateUserInput,
        caller_is_admin: bool,
    ) -> Result<user::Model, ServiceError> {
        let existing = self.get_user(id).await?;
        self.ensure_manageable_user(&existing, caller_is_admin).await?;

        let email = input.email.map(|e| e.trim().to_lowercase());
        if let Some(email) = email.as_deref() {
            if email != existing.email {
                self.ensure_unique_user_email(email, Some(id)).await?;
            }
        }
        if let Some(role_id) = input.role_id {
            self.ensure_assignable_role(role_id, caller_is_admin).await?;
        }
        let password_hash = match input.password.as_deref() {
            Some(password) => {
                ensure_password_length(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let mut active: user::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(hash) = password_hash {
            active.password_hash = Set(hash);
        }
        if let Some(role_id) = input.role_id {
            active.role_id = Set(Some(role_id));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        info!(user_id = %id, "Updated user");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid, caller_is_admin: bool) -> Result<(), ServiceError> {
        let existing = self.get_user(id).await?;
        self.ensure_manageable_user(&existing, caller_is_admin).await?;
        existing.delete(&*self.db).await?;
        info!(user_id = %id, "Deleted user");
        Ok(())
    }

    /// Creates the admin role and the first administrator when the email is unused
    #[instrument(skip(self, password))]
    pub async fn bootstrap_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<user::Model>, ServiceError> {
        let email = email.trim().to_lowercase();
        if self.find_user_by_email(&email).await?.is_some() {
            info!(%email, "Bootstrap administrator already exists");
            return Ok(None);
        }
        ensure_password_length(password)?;

        let txn = self.db.begin().await?;
        let now = Utc::now();
        let admin_role = match Role::find()
            .filter(role::Column::Name.eq(ADMIN_ROLE))
            .one(&txn)
            .await?
        {
            Some(existing) => existing,
            None => {
                role::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(ADMIN_ROLE.to_string()),
                    description: Set(Some("Built-in role with every ability".to_string())),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(email),
            password_hash: Set(hash_password(password)?),
            role_id: Set(Some(admin_role.id)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        warn!(user_id = %user.id, "Created bootstrap administrator; change its password after first login");
        Ok(Some(user))
    }

    async fn ensure_assignable_role(
        &self,
        role_id: Uuid,
        caller_is_admin: bool,
    ) -> Result<(), ServiceError> {
        let role = Role::find_by_id(role_id).one(&*self.db).await?.ok_or_else(|| {
            ServiceError::ValidationError(format!("Role {} does not exist", role_id))
        })?;
        if role.name == ADMIN_ROLE && !caller_is_admin {
            return Err(ServiceError::Forbidden(
                "Only administrators can grant the admin role".to_string(),
            ));
        }
        Ok(())
    }

    async fn ensure_manageable_user(
        &self,
        user: &user::Model,
        caller_is_admin: bool,
    ) -> Result<(), ServiceError> {
        if caller_is_admin {
            return Ok(());
        }
        if self.role_name(user.role_id).await?.as_deref() == Some(ADMIN_ROLE) {
            return Err(ServiceError::Forbidden(
                "Only administrators can modify administrator accounts".to_string(),
            ));
        }
        Ok(())
    }

    async fn ensure_unique_user_email(&self, email: &str, exclude_id: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = User::find().filter(user::Column::Email.eq(email));
        if let Some(id) = exclude_id {
            query = query.filter(user::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("A user with email {} already exists", email)));
        }
        Ok(())
    }
}

/// Links `keys` to a role, creating missing permission rows
async fn link_permissions<C>(db: &C, role_id: Uuid, keys: &[String]) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    for key in keys {
        let permission = match Permission::find()
            .filter(permission::Column::Key.eq(key.as_str()))
            .one(db)
            .await?
        {
            Some(existing) => existing,
            None => {
                permission::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    key: Set(key.clone()),
                    description: Set(None),
                    created_at: Set(Utc::now()),
                }
                .insert(db)
                .await?
            }
        };

        role_permission::ActiveModel {
            id: Set(Uuid::new_v4()),
            role_id: Set(role_id),
            permission_id: Set(permission.id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Trims, de-duplicates and checks every key against the ability map
pub fn normalize_permission_keys(keys: &[String]) -> Result<Vec<String>, ServiceError> {
    let mut normalized: Vec<String> = Vec::with_capacity(keys.len());
    let mut unknown = Vec::new();

    for key in keys.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        if !is_known_key(key) {
            unknown.push(key.to_string());
        } else if !normalized.iter().any(|k| k == key) {
            normalized.push(key.to_string());
        }
    }

    if !unknown.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "Unknown permission key(s): {}",
            unknown.join(", ")
        )));
    }
    normalized.sort();
    Ok(normalized)
}

/// Role names with built-in meaning in tokens
fn is_reserved_role_name(name: &str) -> bool {
    [ADMIN_ROLE, CUSTOMER_ROLE]
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name.trim()))
}

fn ensure_not_reserved(name: &str) -> Result<(), ServiceError> {
    if is_reserved_role_name(name) {
        return Err(ServiceError::Conflict(format!("Role name {} is reserved", name)));
    }
    Ok(())
}

fn ensure_not_built_in(role: &role::Model) -> Result<(), ServiceError> {
    if is_reserved_role_name(&role.name) {
        return Err(ServiceError::Conflict(format!(
            "Built-in role {} cannot be changed",
            role.name
        )));
    }
    Ok(())
}

fn ensure_password_length(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// A role and the permission keys it grants
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: role::Model,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateRoleInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateRoleInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreatePermissionInput {
    pub key: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = normalize_permission_keys(&keys(&["products:read", "products:fly"])).unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(msg) if msg.contains("products:fly"));
    }

    #[test]
    fn keys_are_deduplicated_and_sorted() {
        let normalized =
            normalize_permission_keys(&keys(&[" orders:read", "all:manage", "orders:read", ""])).unwrap();
        assert_eq!(normalized, keys(&["all:manage", "orders:read"]));
    }

    #[tokio::test]
    async fn role_permissions_are_replaced_on_update() {
        let (db, _) = setup().await;
        let service = AccessService::new(db);

        let created = service
            .create_role(CreateRoleInput {
                name: "catalog-editor".to_string(),
                description: None,
                permissions: keys(&["products:read", "products:update"]),
            })
            .await
            .unwrap();
        assert_eq!(created.permissions, keys(&["products:read", "products:update"]));

        let updated = service
            .update_role(
                created.role.id,
                UpdateRoleInput {
                    permissions: Some(keys(&["reviews:manage"])),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.permissions, keys(&["reviews:manage"]));

        let (all, total) = service.list_permissions(1, 50).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn deleting_role_detaches_users() {
        let (db, _) = setup().await;
        let service = AccessService::new(db);

        let role = service
            .create_role(CreateRoleInput {
                name: "support".to_string(),
                description: None,
                permissions: keys(&["complaints:manage"]),
            })
            .await
            .unwrap();
        let user = service
            .create_user(
                CreateUserInput {
                    name: "Kiran".to_string(),
                    email: "kiran@example.com".to_string(),
                    password: "long-enough-pw".to_string(),
                    role_id: Some(role.role.id),
                    is_active: None,
                },
                false,
            )
            .await
            .unwrap();

        service.delete_role(role.role.id).await.unwrap();
        assert_eq!(service.get_user(user.id).await.unwrap().role_id, None);
        assert_matches!(service.get_role(role.role.id).await, Err(ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn short_passwords_and_missing_roles_are_rejected() {
        let (db, _) = setup().await;
        let service = AccessService::new(db);

        let short = service
            .create_user(
                CreateUserInput {
                    name: "A".to_string(),
                    email: "a@example.com".to_string(),
                    password: "short".to_string(),
                    role_id: None,
                    is_active: None,
                },
                false,
            )
            .await;
        assert_matches!(short, Err(ServiceError::ValidationError(_)));

        let missing_role = service
            .create_user(
                CreateUserInput {
                    name: "B".to_string(),
                    email: "b@example.com".to_string(),
                    password: "long-enough-pw".to_string(),
                    role_id: Some(Uuid::new_v4()),
                    is_active: None,
                },
                false,
            )
            .await;
        assert_matches!(missing_role, Err(ServiceError::ValidationError(_)));
    }

    #[rstest]
    #[case("admin")]
    #[case("Admin ")]
    #[case("customer")]
    #[tokio::test]
    async fn reserved_role_names_cannot_be_claimed(#[case] name: &str) {
        let (db, _) = setup().await;
        let service = AccessService::new(db);

        let created = service
            .create_role(CreateRoleInput {
                name: name.to_string(),
                description: None,
                permissions: Vec::new(),
            })
            .await;
        assert_matches!(created, Err(ServiceError::Conflict(_)));

        let role = service
            .create_role(CreateRoleInput {
                name: "packers".to_string(),
                description: None,
                permissions: keys(&["orders:read"]),
            })
            .await
            .unwrap();
        let renamed = service
            .update_role(
                role.role.id,
                UpdateRoleInput {
                    name: Some(name.to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert_matches!(renamed, Err(ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn bootstrap_admin_is_created_once_and_guarded() {
        let (db, _) = setup().await;
        let service = AccessService::new(db);

        let admin = service
            .bootstrap_admin("Owner", "Owner@Example.com", "first-login-secret")
            .await
            .unwrap()
            .expect("created on first run");
        assert_eq!(admin.email, "owner@example.com");
        assert_eq!(service.role_name(admin.role_id).await.unwrap().as_deref(), Some(ADMIN_ROLE));
        assert!(service
            .bootstrap_admin("Owner", "owner@example.com", "first-login-secret")
            .await
            .unwrap()
            .is_none());

        let admin_role_id = admin.role_id.expect("admin role");
        assert_matches!(
            service
                .update_role(
                    admin_role_id,
                    UpdateRoleInput {
                        name: Some("owners".to_string()),
                        ..Default::default()
                    },
                )
                .await,
            Err(ServiceError::Conflict(_))
        );
        assert_matches!(service.delete_role(admin_role_id).await, Err(ServiceError::Conflict(_)));

        let staff_grant = service
            .create_user(
                CreateUserInput {
                    name: "Mallory".to_string(),
                    email: "mallory@example.com".to_string(),
                    password: "long-enough-pw".to_string(),
                    role_id: Some(admin_role_id),
                    is_active: None,
                },
                false,
            )
            .await;
        assert_matches!(staff_grant, Err(ServiceError::Forbidden(_)));

        let takeover = service
            .update_user(
                admin.id,
                UpdateUserInput {
                    password: Some("attacker-chosen".to_string()),
                    ..Default::default()
                },
                false,
            )
            .await;
        assert_matches!(takeover, Err(ServiceError::Forbidden(_)));
        assert_matches!(service.delete_user(admin.id, false).await, Err(ServiceError::Forbidden(_)));

        let granted = service
            .create_user(
                CreateUserInput {
                    name: "Deputy".to_string(),
                    email: "deputy@example.com".to_string(),
                    password: "long-enough-pw".to_string(),
                    role_id: Some(admin_role_id),
                    is_active: None,
                },
                true,
            )
            .await
            .unwrap();
        assert_eq!(granted.role_id, Some(admin_role_id));
    }
}
