pub mod comments;
pub mod forums;
pub mod pages;
pub mod posts;
pub mod users;
