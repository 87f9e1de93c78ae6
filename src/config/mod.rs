//! Configuration module

mod site;

pub use site::ContentConfig;
pub use site::SiteConfig;
pub use site::ACCESS_TOKEN_ENV;
