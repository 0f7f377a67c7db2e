pub mod code;
pub mod db;
pub mod participant;
pub mod round;
pub mod settings;
