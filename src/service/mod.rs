pub mod availability;
pub mod calendar_service;
pub mod office_hours_source;
pub mod openai_service;
pub mod routing;
pub mod slot_resolver;
