//! DocuMind: users register, log in with a bearer token and keep a private list of
//! uploaded PDF/DOCX documents.

pub mod app;
pub mod auth;
pub mod config;
pub mod documents;
pub mod error;
pub mod state;
pub mod storage;
pub mod store;
