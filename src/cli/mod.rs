pub mod console;
pub mod ui;
