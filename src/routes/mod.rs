pub mod appointments;
pub mod shops;
