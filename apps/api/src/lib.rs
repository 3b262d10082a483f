//! Résumé builder core: the résumé document model, the content and session
//! stores, section editors, the Supabase adapter, and the HTTP surface.

pub mod config;
pub mod document;
pub mod editor;
pub mod errors;
pub mod models;
pub mod remote;
pub mod routes;
pub mod state;
pub mod store;
