//! Data field endpoints. Positions are never accepted from the client; the
//! catalog assigns and shifts them.

use hyper::{body::Bytes, Request, Response};
use serde_json::{json, Map, Value};

use super::request_utils::{
    caller_id, flag, json_response, map_catalog_error, number, parse_object,
    read_request_body_with_timeout, text, RequestBody, RouteParams,
};
use crate::router::{AppState, RouterError};
use catalog_core::coordinator::{FieldPatch, NewField};

fn field_attributes(body: &Map<String, Value>) -> Result<FieldPatch, RouterError> {
    Ok(FieldPatch {
        field_name: text(body, "fieldName")?,
        field_size: number(body, "fieldSize")?,
        field_type: text(body, "fieldType")?,
        description: text(body, "description")?,
        packed: flag(body, "packed")?,
        valid_data_notes: text(body, "validDataNotes")?,
        archive: flag(body, "archive")?,
    })
}

/// Appends a field to a data file.
///
/// # Endpoint
/// `POST /api/datafiles/{fileId}/fields`
///
/// # Request Body
/// ```json
/// {
///   "fieldName": "CUST-ID",
///   "fieldSize": 8,
///   "fieldType": "NUMERIC",
///   "description": "Customer number",
///   "packed": false
/// }
/// ```
///
/// # Response
/// - **201 Created**: The field with its assigned `begPosition` and `endPosition`
///
/// # Errors
/// - **400 Bad Request**: Missing name, size below 1, or unknown type
/// - **403 Forbidden**: Caller does not own the file
/// - **404 Not Found**: No such file
///
/// # Example
/// ```bash
/// curl -X POST http://localhost:8080/api/datafiles/$FILE/fields \
///   -H "x-caller-id: jdoe" -H "Content-Type: application/json" \
///   -d '{"fieldName": "CUST-ID", "fieldSize": "8", "fieldType": "numeric"}'
/// ```
pub async fn create_field<B: RequestBody>(
    req: Request<B>,
    params: RouteParams,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let caller = caller_id(&req)?;
    let body = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let attrs = field_attributes(&parse_object(&body)?)?;

    let spec = NewField {
        field_name: attrs.field_name,
        field_size: attrs.field_size,
        field_type: attrs.field_type,
        description: attrs.description,
        packed: attrs.packed,
        valid_data_notes: attrs.valid_data_notes,
        archive: attrs.archive,
    };
    let field = state
        .catalog
        .create_field(params.file_id()?, spec, &caller)
        .await
        .map_err(map_catalog_error)?;
    json_response(201, field)
}

/// Updates a field. A new `fieldSize` shifts every later field of the file.
///
/// # Endpoint
/// `PATCH /api/datafiles/{fileId}/fields/{fieldId}`
///
/// # Errors
/// - **400 Bad Request**: No attribute given, or a malformed one
/// - **403 Forbidden**: Caller does not own the file
/// - **404 Not Found**: No such field in this file
/// - **500 Internal Server Error**: The shift could not be committed; nothing changed
pub async fn update_field<B: RequestBody>(
    req: Request<B>,
    params: RouteParams,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let caller = caller_id(&req)?;
    let (file_id, field_id) = (params.file_id()?, params.field_id()?);
    let body = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let patch = field_attributes(&parse_object(&body)?)?;

    state
        .catalog
        .ensure_field_in_file(file_id, field_id)
        .await
        .map_err(map_catalog_error)?;
    let field = state
        .catalog
        .update_field(field_id, patch, &caller)
        .await
        .map_err(map_catalog_error)?;
    json_response(200, field)
}

/// Deletes a field with its valid values and sub-structures. Later fields
/// keep their positions.
///
/// # Endpoint
/// `DELETE /api/datafiles/{fileId}/fields/{fieldId}`
///
/// # Response
/// - **200 OK**: `{"id": "<fieldId>"}`
pub async fn delete_field<B: RequestBody>(
    req: Request<B>,
    params: RouteParams,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let caller = caller_id(&req)?;
    let (file_id, field_id) = (params.file_id()?, params.field_id()?);

    state
        .catalog
        .ensure_field_in_file(file_id, field_id)
        .await
        .map_err(map_catalog_error)?;
    let id = state
        .catalog
        .delete_field(field_id, &caller)
        .await
        .map_err(map_catalog_error)?;
    json_response(200, json!({ "id": id }))
}
