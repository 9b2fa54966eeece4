pub mod category_service;
pub mod comment_service;
pub mod post_service;
pub mod rating_service;
pub mod subscription_service;
pub mod upload_service;
pub mod user_service;
