use axum::extract::{Extension, State};
use rusqlite::Connection;

use super::check_id;
use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Form, Json, Path};
use crate::id::EntityType;
use crate::middleware::RequestContext;
use crate::models::{MemberRole, Project, ProjectDetails, ProjectForm, ProjectInput};
use crate::views::{Lookup, PROJECTS_VIEW};

/// Load a project the caller belongs to, with the caller's role.
///
/// Unknown project → 404, not a member → 403.
fn load_for_member(conn: &Connection, project_id: &str, user_id: &str) -> Result<(Project, MemberRole)> {
    let project = queries::get_project_by_id(conn, project_id)?.or_not_found(msg::PROJECT_NOT_FOUND)?;
    let membership = queries::get_project_member(conn, project_id, user_id)?
        .ok_or_else(|| AppError::Forbidden(msg::NOT_PROJECT_MEMBER.into()))?;
    Ok((project, membership.role))
}

/// Every selected member must exist in the directory.
fn check_members_exist(conn: &Connection, input: &ProjectInput) -> Result<()> {
    let missing = queries::find_missing_directory_ids(conn, &input.member_ids)?;
    if !missing.is_empty() {
        tracing::warn!(?missing, "Rejected unknown project members");
        return Err(AppError::BadRequest(msg::UNKNOWN_MEMBER.into()));
    }
    Ok(())
}

fn details(conn: &Connection, project: Project, role: MemberRole) -> Result<ProjectDetails> {
    let members = queries::list_project_members(conn, &project.id)?;
    Ok(ProjectDetails { project, role, members })
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<serde_json::Value>> {
    let generation = match state.views.get(PROJECTS_VIEW, &ctx.user_id) {
        Lookup::Hit(cached) => return Ok(Json(cached)),
        Lookup::Miss(generation) => generation,
    };

    let conn = state.db.get()?;
    let projects = queries::list_projects_for_user(&conn, &ctx.user_id)?;
    let body = serde_json::to_value(&projects)?;
    state.views.put(PROJECTS_VIEW, &ctx.user_id, generation, body.clone());
    Ok(Json(body))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ProjectForm>,
) -> Result<Json<ProjectDetails>> {
    let mut input = form.validate()?;
    input.member_ids.retain(|id| *id != ctx.user_id);

    let mut conn = state.db.get()?;
    check_members_exist(&conn, &input)?;

    let project = queries::create_project(&mut conn, &ctx.user_id, &input)?;
    state.views.invalidate(PROJECTS_VIEW);

    tracing::info!(
        project_id = %project.id,
        user_id = %ctx.user_id,
        members = input.member_ids.len(),
        "Created project"
    );

    Ok(Json(details(&conn, project, MemberRole::Owner)?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<ProjectDetails>> {
    check_id(EntityType::Project, &id)?;
    let conn = state.db.get()?;
    let (project, role) = load_for_member(&conn, &id, &ctx.user_id)?;
    Ok(Json(details(&conn, project, role)?))
}

/// Rename, change the image, and add newly selected members.
///
/// Open to every member, not just the owner.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Form(form): Form<ProjectForm>,
) -> Result<Json<ProjectDetails>> {
    check_id(EntityType::Project, &id)?;
    let mut conn = state.db.get()?;

    let (_, role) = load_for_member(&conn, &id, &ctx.user_id)?;

    let input = form.validate()?;
    check_members_exist(&conn, &input)?;

    let project = queries::update_project(&mut conn, &id, &input)?.or_not_found(msg::PROJECT_NOT_FOUND)?;
    state.views.invalidate(PROJECTS_VIEW);

    tracing::info!(project_id = %id, user_id = %ctx.user_id, "Updated project");
    Ok(Json(details(&conn, project, role)?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    check_id(EntityType::Project, &id)?;
    let mut conn = state.db.get()?;

    let (_, role) = load_for_member(&conn, &id, &ctx.user_id)?;
    if !role.can_delete_project() {
        return Err(AppError::Forbidden(msg::ONLY_OWNER_CAN_DELETE.into()));
    }

    if !queries::delete_project(&mut conn, &id)? {
        return Err(AppError::NotFound(msg::PROJECT_NOT_FOUND.into()));
    }
    state.views.invalidate(PROJECTS_VIEW);

    tracing::info!(project_id = %id, user_id = %ctx.user_id, "Deleted project");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Owner-only removal of a single member. The owner row stays.
pub async fn remove_project_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>> {
    check_id(EntityType::Project, &id)?;
    let conn = state.db.get()?;

    let (_, role) = load_for_member(&conn, &id, &ctx.user_id)?;
    if !role.can_delete_project() {
        return Err(AppError::Forbidden(msg::ONLY_OWNER_CAN_REMOVE_MEMBERS.into()));
    }

    let target = queries::get_project_member(&conn, &id, &user_id)?.or_not_found(msg::MEMBER_NOT_FOUND)?;
    if target.role == MemberRole::Owner {
        return Err(AppError::BadRequest(msg::CANNOT_REMOVE_OWNER.into()));
    }

    queries::remove_project_member(&conn, &id, &user_id)?;
    state.views.invalidate(PROJECTS_VIEW);

    tracing::info!(project_id = %id, removed = %user_id, "Removed project member");
    Ok(Json(serde_json::json!({ "success": true })))
}
