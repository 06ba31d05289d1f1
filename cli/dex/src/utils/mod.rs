pub mod dialog;
pub mod display;
pub mod errors;
pub mod init;
pub mod message;
