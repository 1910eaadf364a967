pub mod attendance;
pub mod backup_exchange;
pub mod classes;
pub mod core;
pub mod instructors;
pub mod students;
pub mod views;
