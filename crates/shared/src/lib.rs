pub mod error;
pub mod protocol;
pub mod request;
pub mod router;
pub mod sidebar;
pub mod view;
