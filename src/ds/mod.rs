mod error;
mod transport;

pub use error::DeliveryServiceError;
pub use transport::{MessageDispatcher, Namespace};
