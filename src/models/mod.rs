// src/models/mod.rs

pub mod comment;
pub mod contact;
pub mod post;
pub mod user;
