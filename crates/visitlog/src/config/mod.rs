pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApiEndpoints, AuthConfig, CalendarConfig, Config, GoogleConfig, ImageConfig, RowStoreConfig,
    ServerSettings, SheetsConfig, SubmissionConfig, CALENDAR_ID_PLACEHOLDER,
};
