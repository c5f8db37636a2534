//! HTTP endpoint implementations for data files, fields and valid values.

mod field_handlers;
mod file_handlers;
pub mod request_utils;
pub mod response;
mod valid_data_handlers;

pub use field_handlers::{create_field, delete_field, update_field};
pub use file_handlers::{create_file, delete_file, get_file, list_files, update_file};
pub use request_utils::{RequestBody, RouteParams};
pub use response::{error_response, success_response, ApiError, ApiResponse, ErrorResponse};
pub use valid_data_handlers::{create_valid_data, delete_valid_data, update_valid_data};
