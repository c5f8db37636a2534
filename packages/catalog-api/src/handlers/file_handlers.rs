//! Data file endpoints.

use hyper::{body::Bytes, Request, Response};
use serde_json::{json, Map, Value};

use super::request_utils::{
    caller_id, flag, json_response, map_catalog_error, number, parse_object,
    read_request_body_with_timeout, text, RequestBody, RouteParams,
};
use crate::router::{AppState, RouterError};
use catalog_core::coordinator::{DataFilePatch, NewDataFile};

fn file_attributes(body: &Map<String, Value>) -> Result<DataFilePatch, RouterError> {
    Ok(DataFilePatch {
        short_name: text(body, "shortName")?,
        long_name: text(body, "longName")?,
        file_location: text(body, "fileLocation")?,
        file_size: number(body, "fileSize")?,
        doc_link: text(body, "docLink")?,
        archive: flag(body, "archive")?,
    })
}

/// Lists the caller's data files.
///
/// # Endpoint
/// `GET /api/datafiles`
///
/// # Response
/// - **200 OK**: Files ordered by `shortName`, each with `fields`
///   (`id`, `fieldName`, `fileId`) ordered by `begPosition`
pub async fn list_files<B: RequestBody>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let caller = caller_id(&req)?;
    let files = state
        .catalog
        .list_files(&caller)
        .await
        .map_err(map_catalog_error)?;
    json_response(200, files)
}

/// Creates a data file owned by the caller.
///
/// # Endpoint
/// `POST /api/datafiles`
///
/// # Request Body
/// ```json
/// {
///   "shortName": "CUSTMAST",
///   "longName": "Customer master",
///   "fileLocation": "/prod/custmast.dat",
///   "fileSize": 4096,
///   "docLink": "https://wiki/custmast",
///   "archive": false
/// }
/// ```
///
/// # Response
/// - **201 Created**: The new file
///
/// # Errors
/// - **400 Bad Request**: Missing or malformed attribute
pub async fn create_file<B: RequestBody>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let caller = caller_id(&req)?;
    let body = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let attrs = file_attributes(&parse_object(&body)?)?;

    let spec = NewDataFile {
        short_name: attrs.short_name,
        long_name: attrs.long_name,
        file_location: attrs.file_location,
        file_size: attrs.file_size,
        doc_link: attrs.doc_link,
        archive: attrs.archive,
    };
    let file = state
        .catalog
        .create_file(spec, &caller)
        .await
        .map_err(map_catalog_error)?;
    json_response(201, file)
}

/// Reads a data file with its full field layout.
///
/// # Endpoint
/// `GET /api/datafiles/{fileId}`
///
/// # Response
/// - **200 OK**: The file with `fields` ordered by `begPosition`, each with
///   `validData` and `dataStructures`
///
/// # Errors
/// - **404 Not Found**: No such file
pub async fn get_file<B: RequestBody>(
    req: Request<B>,
    params: RouteParams,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    caller_id(&req)?;
    let detail = state
        .catalog
        .get_file(params.file_id()?)
        .await
        .map_err(map_catalog_error)?;
    json_response(200, detail)
}

/// Updates data file attributes.
///
/// # Endpoint
/// `PATCH /api/datafiles/{fileId}`
///
/// # Errors
/// - **400 Bad Request**: No attribute given, or a malformed one
/// - **403 Forbidden**: Caller does not own the file
/// - **404 Not Found**: No such file
pub async fn update_file<B: RequestBody>(
    req: Request<B>,
    params: RouteParams,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let caller = caller_id(&req)?;
    let body = read_request_body_with_timeout(req, state.config.request_timeout_ms).await?;
    let patch = file_attributes(&parse_object(&body)?)?;

    let file = state
        .catalog
        .update_file(params.file_id()?, patch, &caller)
        .await
        .map_err(map_catalog_error)?;
    json_response(200, file)
}

/// Deletes a data file with all of its fields and their dependent rows.
///
/// # Endpoint
/// `DELETE /api/datafiles/{fileId}`
///
/// # Response
/// - **200 OK**: `{"id": "<fileId>"}`, also when the file did not exist
pub async fn delete_file<B: RequestBody>(
    req: Request<B>,
    params: RouteParams,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let caller = caller_id(&req)?;
    let id = state
        .catalog
        .delete_file(params.file_id()?, &caller)
        .await
        .map_err(map_catalog_error)?;
    json_response(200, json!({ "id": id }))
}
