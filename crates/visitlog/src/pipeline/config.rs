use chrono::FixedOffset;

use crate::config::Config;

pub struct PipelineConfig {
    pub id_prefix: String,
    pub local_offset: FixedOffset,
    pub spreadsheet_id: String,
    pub sheet_tab: String,
    pub image_folder_id: String,
    /// `None` disables follow-up scheduling.
    pub calendar_id: Option<String>,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            id_prefix: config.submission.id_prefix.clone(),
            local_offset: config.submission.local_offset(),
            spreadsheet_id: config.sheets.response_spreadsheet_id.clone(),
            sheet_tab: config.sheets.response_tab_name.clone(),
            image_folder_id: config.sheets.image_folder_id.clone(),
            calendar_id: config.calendar.destination().map(str::to_string),
        }
    }
}
