pub mod app;
pub mod record;
