use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{LooseId, Message, id_param, required_id, required_text};
use crate::model::{Role, RoleFields};
use crate::permission::PermissionDocument;
use crate::procedure::{Empty, Meta, Procedure};
use crate::router::{Context, Router};
use crate::store::{departments, roles};
use crate::{Error, Module, Result};

pub struct RolesModule;

impl Module for RolesModule {
    fn name(&self) -> &'static str {
        "roles"
    }

    fn routes(&self, router: &mut Router) {
        router.procedure::<ListRoles>();
        router.procedure::<GetRole>();
        router.procedure::<CreateRole>();
        router.procedure::<UpdateRole>();
    }
}

/// Body for creating or replacing a role.
///
/// `permissions` may be any stored shape, including legacy flag maps. It is
/// merged onto the catalog before it is written; omitting it stores the
/// all-denied document.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleInput {
    pub name: Option<String>,
    pub department_id: Option<LooseId>,
    #[schemars(with = "Option<PermissionDocument>")]
    pub permissions: Option<Value>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleCreated {
    pub message: String,
    pub role_id: i64,
}

async fn fields(ctx: &Context, input: RoleInput) -> Result<RoleFields> {
    let name = required_text(input.name, "name", "Role name is required")?;
    let department_id = required_id(input.department_id, "departmentId", "Department is required")?;
    if !departments::exists(ctx.require_db()?, department_id).await? {
        return Err(Error::validation("departmentId", "Department does not exist"));
    }
    let permissions = input
        .permissions
        .as_ref()
        .map(PermissionDocument::deserialize)
        .unwrap_or_default();
    Ok(RoleFields {
        name,
        department_id,
        permissions,
    })
}

pub struct ListRoles;

impl Procedure for ListRoles {
    fn meta() -> Meta {
        Meta::get("/api/roles")
            .summary("List roles with employee counts")
            .tag("roles")
    }

    type Input = Empty;
    type Output = Vec<Role>;

    async fn handle(ctx: Context, _input: Empty) -> Result<Vec<Role>> {
        roles::list(ctx.require_db()?).await
    }
}

pub struct GetRole;

impl Procedure for GetRole {
    fn meta() -> Meta {
        Meta::get("/api/roles/{id}").summary("Get a role").tag("roles")
    }

    type Input = Empty;
    type Output = Role;

    async fn handle(ctx: Context, _input: Empty) -> Result<Role> {
        let id = id_param(&ctx)?;
        roles::get(ctx.require_db()?, id)
            .await?
            .ok_or_else(|| Error::NotFound("Role".into()))
    }
}

pub struct CreateRole;

impl Procedure for CreateRole {
    fn meta() -> Meta {
        Meta::post("/api/roles")
            .summary("Create a role template")
            .tag("roles")
            .status(201)
    }

    type Input = RoleInput;
    type Output = RoleCreated;

    async fn handle(ctx: Context, input: RoleInput) -> Result<RoleCreated> {
        let fields = fields(&ctx, input).await?;
        let role_id = roles::create(ctx.require_db()?, &fields).await?;
        tracing::info!(
            role_id,
            name = %fields.name,
            groups = ?fields.permissions.enabled_groups(),
            "role created"
        );
        Ok(RoleCreated {
            message: "Role template created successfully".into(),
            role_id,
        })
    }
}

pub struct UpdateRole;

impl Procedure for UpdateRole {
    fn meta() -> Meta {
        Meta::put("/api/roles/{id}")
            .summary("Replace a role and its permission document")
            .tag("roles")
    }

    type Input = RoleInput;
    type Output = Message;

    async fn handle(ctx: Context, input: RoleInput) -> Result<Message> {
        let id = id_param(&ctx)?;
        let fields = fields(&ctx, input).await?;
        if !roles::update(ctx.require_db()?, id, &fields).await? {
            return Err(Error::NotFound("Role".into()));
        }
        tracing::info!(role_id = id, "role updated");
        Ok(Message::new("Role updated successfully"))
    }
}
