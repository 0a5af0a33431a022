//! # aw-client
//!
//! The Azure REST client capability: a narrow trait of paginated
//! enumerators over Microsoft Graph and Azure Resource Manager, its
//! production implementation (OAuth2 client credentials, retry, rate
//! limiting, pagination), and a configurable mock for tests.

mod auth;
mod client;
mod config;
mod error;
mod http;
pub mod mock;
mod pages;
mod secure_string;

pub use client::{AzureClient, AzureRestClient, ItemStream};
pub use config::AzureConfig;
pub use error::{ClientError, ClientResult};
pub use secure_string::SecureString;
