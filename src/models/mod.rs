pub mod comment;
pub mod forum;
pub mod post;
pub mod tag;
pub mod user;
pub mod vote;

pub use comment::*;
pub use forum::*;
pub use post::*;
pub use tag::*;
pub use user::*;
pub use vote::*;
