pub mod dispatch_service;
pub mod form_service;
pub mod sink_service;
pub mod static_service;
