pub mod capture;
pub mod core;
pub mod error;
pub mod gateway;
pub mod http;
pub mod location;
pub mod poller;
pub mod relay;
pub mod session;
pub mod socket;
