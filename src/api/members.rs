//! Member endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::AppResult, models::Member};

/// Member listing filters
#[derive(Deserialize, IntoParams)]
pub struct MemberQuery {
    /// Name prefix
    pub q: Option<String>,
}

/// List members, optionally filtered by name prefix
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    params(MemberQuery),
    responses(
        (status = 200, description = "Matching members", body = Vec<Member>)
    )
)]
pub async fn list_members(
    State(state): State<crate::AppState>,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<Vec<Member>>> {
    let members = match query.q.as_deref() {
        Some(prefix) => state.services.catalog.search_members(prefix).await?,
        None => state.services.catalog.list_members().await?,
    };
    Ok(Json(members))
}

/// Get a member by id
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "The member", body = Member),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Member>> {
    let member = state.services.catalog.get_member(id).await?;
    Ok(Json(member))
}
