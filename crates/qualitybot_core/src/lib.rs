pub mod domain;
pub mod ports;

pub use domain::{ChatTurn, QualityData, User, UserCredentials};
pub use ports::{ChatService, PortError, PortResult, UserStore};
