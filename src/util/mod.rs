pub mod clock;
pub mod cron_expr;
pub mod telemetry;

pub use clock::*;
pub use cron_expr::*;
pub use telemetry::*;
