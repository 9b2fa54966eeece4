pub mod category;
pub mod comment;
pub mod post;
pub mod rating;
pub mod subscription;
pub mod user;

pub use category::*;
pub use comment::*;
pub use post::*;
pub use rating::*;
pub use subscription::*;
pub use user::*;
