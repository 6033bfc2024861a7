use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::dto::{
    CreateRecordRequest, ExportQuery, ExportRow, ImportReport, ImportRow, ListQuery,
    UpdateRecordRequest,
};
use super::query::{filter_records, record_stats, sort_records, unique_categories, RecordFilter};
use super::repo::{NewRecord, RecordChanges, RecordStore};
use super::repo_types::Record;
use crate::auth::extractors::AuthUser;
use crate::error::{Error, Result};
use crate::state::AppState;
use crate::users::repo_types::Role;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/records", get(list_records).post(create_record))
        .route("/records/stats", get(get_stats))
        .route("/records/categories", get(get_categories))
        .route("/records/export", get(export_records))
        .route("/records/import", post(import_records))
        .route(
            "/records/:id",
            get(get_record).patch(update_record).delete(delete_record),
        )
}

fn parse_filter(q: &ListQuery) -> Result<RecordFilter> {
    let created_from = match &q.from {
        Some(raw) => Some(
            OffsetDateTime::parse(raw, &Rfc3339)
                .map_err(|_| Error::Validation("Invalid `from` date".into()))?,
        ),
        None => None,
    };
    let created_to = match &q.to {
        Some(raw) => Some(
            OffsetDateTime::parse(raw, &Rfc3339)
                .map_err(|_| Error::Validation("Invalid `to` date".into()))?,
        ),
        None => None,
    };
    Ok(RecordFilter {
        category: q.category.clone(),
        status: q.status,
        created_from,
        created_to,
        search: q.search.clone(),
    })
}

fn validate_row(title: &str, category: &str, value: f64) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("Title is required".into()));
    }
    if category.trim().is_empty() {
        return Err(Error::Validation("Category is required".into()));
    }
    if !value.is_finite() {
        return Err(Error::Validation("Value must be a finite number".into()));
    }
    Ok(())
}

/// The caller's own records, filtered and optionally sorted.
#[instrument(skip(state))]
pub async fn list_records(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Record>>> {
    let filter = parse_filter(&q)?;
    let records = RecordStore::new(state.store.as_ref()).list_by_user(&claims.id)?;
    let mut records = filter_records(records, &filter);
    if let Some(field) = q.sort {
        sort_records(&mut records, field, q.dir);
    }
    Ok(Json(records))
}

#[instrument(skip(state, payload))]
pub async fn create_record(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<Record>)> {
    validate_row(&payload.title, &payload.category, payload.value)?;

    let record = RecordStore::new(state.store.as_ref()).add(
        &claims.id,
        NewRecord {
            title: payload.title.trim().to_string(),
            description: payload.description,
            category: payload.category.trim().to_string(),
            value: payload.value,
            status: payload.status,
        },
    )?;

    info!(record_id = %record.id, user_id = %claims.id, "record created");
    Ok((StatusCode::CREATED, Json(record)))
}

#[instrument(skip(state))]
pub async fn get_record(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Record>> {
    let record = fetch_owned(&state, &claims.id, claims.role, &id)?;
    Ok(Json(record))
}

#[instrument(skip(state, payload))]
pub async fn update_record(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRecordRequest>,
) -> Result<Json<Record>> {
    fetch_owned(&state, &claims.id, claims.role, &id)?;

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(Error::Validation("Title is required".into()));
        }
    }
    if let Some(value) = payload.value {
        if !value.is_finite() {
            return Err(Error::Validation("Value must be a finite number".into()));
        }
    }

    let updated = RecordStore::new(state.store.as_ref())
        .update(
            &id,
            RecordChanges {
                title: payload.title,
                description: payload.description,
                category: payload.category,
                value: payload.value,
                status: payload.status,
            },
        )?
        .ok_or_else(|| Error::NotFound("Record not found".into()))?;

    info!(record_id = %updated.id, user_id = %claims.id, "record updated");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_record(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    fetch_owned(&state, &claims.id, claims.role, &id)?;

    let deleted = RecordStore::new(state.store.as_ref()).delete(&id)?;
    if !deleted {
        return Err(Error::NotFound("Record not found".into()));
    }
    info!(record_id = %id, user_id = %claims.id, "record deleted");
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<super::query::RecordStats>> {
    let records = RecordStore::new(state.store.as_ref()).list_by_user(&claims.id)?;
    Ok(Json(record_stats(&records)))
}

#[instrument(skip(state))]
pub async fn get_categories(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<String>>> {
    let records = RecordStore::new(state.store.as_ref()).list_by_user(&claims.id)?;
    Ok(Json(unique_categories(&records)))
}

#[instrument(skip(state))]
pub async fn export_records(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(q): Query<ExportQuery>,
) -> Result<Json<Vec<ExportRow>>> {
    let store = RecordStore::new(state.store.as_ref());
    let records = if q.all {
        if claims.role != Role::Admin {
            return Err(Error::Forbidden("admin role required".into()));
        }
        store.list()?
    } else {
        store.list_by_user(&claims.id)?
    };

    let rows = records
        .into_iter()
        .map(|r| ExportRow {
            title: r.title,
            description: r.description,
            category: r.category,
            value: r.value,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
        .collect();
    Ok(Json(rows))
}

/// Bulk insert of flat rows. The batch is validated up front; a bad row
/// rejects the whole request.
#[instrument(skip(state, rows))]
pub async fn import_records(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(rows): Json<Vec<ImportRow>>,
) -> Result<Json<ImportReport>> {
    for (idx, row) in rows.iter().enumerate() {
        validate_row(&row.title, &row.category, row.value).map_err(|e| match e {
            Error::Validation(msg) => Error::Validation(format!("row {}: {}", idx, msg)),
            other => other,
        })?;
    }

    let store = RecordStore::new(state.store.as_ref());
    let imported = rows.len();
    for row in rows {
        store.add(
            &claims.id,
            NewRecord {
                title: row.title.trim().to_string(),
                description: row.description,
                category: row.category.trim().to_string(),
                value: row.value,
                status: row.status,
            },
        )?;
    }

    info!(user_id = %claims.id, imported, "records imported");
    Ok(Json(ImportReport { imported }))
}

/// Loads a record and checks the caller may touch it. Admins see every
/// record; other callers get not-found for records they do not own, so
/// existence is not leaked.
fn fetch_owned(state: &AppState, caller_id: &str, role: Role, id: &str) -> Result<Record> {
    let record = RecordStore::new(state.store.as_ref())
        .get(id)?
        .ok_or_else(|| Error::NotFound("Record not found".into()))?;
    if record.user_id != caller_id && role != Role::Admin {
        return Err(Error::NotFound("Record not found".into()));
    }
    Ok(record)
}
