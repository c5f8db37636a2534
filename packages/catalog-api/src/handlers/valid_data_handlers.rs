//! Valid value endpoints.

use hyper::{body::Bytes, Request, Response};

use super::request_utils::{
    caller_id, flag, json_response, map_catalog_error, parse_object,
    read_request_body_with_timeout, text, RequestBody, RouteParams,
};
use crate::router::{AppState, RouterError};
use catalog_core::coordinator::{NewValidData, ValidDataPatch};

/// Adds a valid value to a field; `seqID` is assigned per field.
///
/// # Endpoint
/// `POST /api/datafiles/{fileId}/fields/{fieldId}/validdata`
///
/// # Request Body
/// ```json
/// {"validData": "A", "validDataDesc": "Active"}
/// ```
pub async fn create_valid_data<B: RequestBody>(
    req: Request<B>,
    params: RouteParams,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let caller = caller_id(&req)?;
    let (file_id, field_id) = (params.file_id()?, params.field_id()?);
    let body = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let body = parse_object(&body)?;
    let spec = NewValidData {
        valid_data: text(&body, "validData")?,
        valid_data_desc: text(&body, "validDataDesc")?,
        archive: flag(&body, "archive")?,
    };

    state
        .catalog
        .ensure_field_in_file(file_id, field_id)
        .await
        .map_err(map_catalog_error)?;
    let row = state
        .catalog
        .create_valid_data(field_id, spec, &caller)
        .await
        .map_err(map_catalog_error)?;
    json_response(201, row)
}

/// Updates a valid value.
///
/// # Endpoint
/// `PATCH /api/datafiles/{fileId}/fields/{fieldId}/validdata/{validDataId}`
pub async fn update_valid_data<B: RequestBody>(
    req: Request<B>,
    params: RouteParams,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let caller = caller_id(&req)?;
    let body = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let body = parse_object(&body)?;
    let patch = ValidDataPatch {
        valid_data: text(&body, "validData")?,
        valid_data_desc: text(&body, "validDataDesc")?,
        archive: flag(&body, "archive")?,
    };

    let valid_data_id = locate(&params, &state).await?;
    let row = state
        .catalog
        .update_valid_data(valid_data_id, patch, &caller)
        .await
        .map_err(map_catalog_error)?;
    json_response(200, row)
}

/// Deletes a valid value.
///
/// # Endpoint
/// `DELETE /api/datafiles/{fileId}/fields/{fieldId}/validdata/{validDataId}`
///
/// # Response
/// - **200 OK**: The deleted row
pub async fn delete_valid_data<B: RequestBody>(
    req: Request<B>,
    params: RouteParams,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let caller = caller_id(&req)?;
    let valid_data_id = locate(&params, &state).await?;
    let row = state
        .catalog
        .delete_valid_data(valid_data_id, &caller)
        .await
        .map_err(map_catalog_error)?;
    json_response(200, row)
}

/// Checks the route's file/field/value chain and returns the value id.
async fn locate<'a>(params: &'a RouteParams, state: &AppState) -> Result<&'a str, RouterError> {
    let (file_id, field_id) = (params.file_id()?, params.field_id()?);
    let valid_data_id = params.valid_data_id()?;
    state
        .catalog
        .ensure_field_in_file(file_id, field_id)
        .await
        .map_err(map_catalog_error)?;
    state
        .catalog
        .ensure_valid_data_in_field(field_id, valid_data_id)
        .await
        .map_err(map_catalog_error)?;
    Ok(valid_data_id)
}
