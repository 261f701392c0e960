pub mod domain;
pub mod ports;
pub mod search;
pub mod store;
pub mod validation;

pub use domain::{AuthState, BoardStats, Post, PostId, PostKind, Role, Session, UnknownRole, User, UserId};
pub use ports::{BoardRepository, PortError, PortResult};
pub use store::{LocalDataStore, StoreError, StoreResult};
pub use validation::ValidationError;
