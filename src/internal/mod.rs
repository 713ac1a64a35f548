pub mod audio;
pub mod confidence;
pub mod list;
pub mod models;
pub mod notification;
pub mod ui;
pub mod upload;
pub mod workflow;
