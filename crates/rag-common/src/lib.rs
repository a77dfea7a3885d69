pub mod chat;
pub mod embedding;
pub mod error;
pub mod pdf;
pub mod redis;
pub mod vectordb;
