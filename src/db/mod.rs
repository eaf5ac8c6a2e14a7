pub mod event_config_repository;
pub mod mock_db;
pub mod postgres_event_config_repository;
