pub mod auth;
pub mod categories;
pub mod comments;
pub mod posts;
pub mod redirects;
pub mod users;
