pub mod auth_service;
pub mod bot_service;
pub mod index_engine;
pub mod job_scheduler_service;
pub mod prediction_service;
pub mod price_service;
pub mod report_service;
pub mod settings_service;
pub mod ticker_directory;
