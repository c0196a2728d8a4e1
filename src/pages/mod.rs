pub mod export;
pub mod home;
pub mod not_found;
