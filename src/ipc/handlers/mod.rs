pub mod classes;
pub mod core;
pub mod degrees;
pub mod marks;
pub mod records;
pub mod statistics;
pub mod students;
pub mod users;
