pub mod banner;
pub mod menu;
pub mod order;
pub mod vendor;

pub use banner::*;
pub use menu::*;
pub use order::*;
pub use vendor::*;
