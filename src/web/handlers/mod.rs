pub mod cron;
pub mod posts;
pub mod stats;
pub mod trending;
