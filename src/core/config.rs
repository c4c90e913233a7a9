mod parsing;
mod secret;
mod settings;
mod types;

pub(crate) use types::Settings;
#[allow(unused_imports)]
pub(crate) use types::{
    ApiSettings, CorsSettings, DatabaseSettings, Environment, ExamSettings, RuntimeSettings,
    SecuritySettings, TelemetrySettings,
};
