use serde::{Deserialize, Serialize};

/// One allowed value of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidData {
    pub id: String,
    #[serde(rename = "fileFieldID")]
    pub field_id: String,
    /// 1-based, assigned per field
    #[serde(rename = "seqID")]
    pub seq_id: u32,
    pub valid_data: String,
    pub valid_data_desc: String,
    pub archive: bool,
}

/// Sub-structure described inside a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStructure {
    pub id: String,
    #[serde(rename = "fileFieldID")]
    pub field_id: String,
    #[serde(rename = "dsID")]
    pub ds_id: u32,
    pub ds_beg_position: u32,
    pub ds_end_position: u32,
    pub ds_name: String,
    pub ds_desc: String,
    pub archive: bool,
}
