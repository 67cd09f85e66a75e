pub mod errors;
pub mod health;
pub mod menu;
pub mod middleware;
pub mod orders;

pub use errors::*;
pub use health::*;
pub use menu::*;
pub use middleware::*;
pub use orders::*;
