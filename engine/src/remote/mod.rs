//! Remote service collaborator interfaces

pub mod connection;
pub mod credentials;

pub use connection::{ConnectionFactory, RemoteConnection, Retrieval};
pub use credentials::CredentialStore;
