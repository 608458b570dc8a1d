pub mod conflict;
pub mod coordinator;
pub mod lifecycle;
pub mod timeline;
