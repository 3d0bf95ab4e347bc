pub mod api;
pub mod credentials;
pub mod proxy;
pub mod router;
pub mod search;
pub mod time;
pub mod token;
