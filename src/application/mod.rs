// Application layer - Ingestion and refresh use cases
pub mod clock;
pub mod display_sink;
pub mod ingest_service;
pub mod refresh_service;
pub mod sensor_state;
