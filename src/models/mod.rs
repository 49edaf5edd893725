pub mod appointment;
pub mod office_hours;
pub mod slot;
pub mod transcript;
