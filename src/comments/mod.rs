// src/comments/mod.rs

pub mod permission;
pub mod policy;
pub mod service;
pub mod thread;
pub mod tree;

pub use permission::{can_manage_posts, can_modify_comment};
pub use policy::DeletePolicy;
pub use service::CommentService;
pub use thread::{CommentApi, CommentThread};
pub use tree::{CommentForest, CommentNode};
