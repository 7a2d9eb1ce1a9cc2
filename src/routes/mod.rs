pub mod form_routes;
pub mod page_routes;
