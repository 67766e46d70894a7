// Request pipelines: the write path (submit) and the read paths (feed,
// detail, reactions), plus the daily leaderboard they both touch.

pub mod feed;
pub mod leaderboard;
pub mod submit;

pub use feed::{FeedEntry, FeedPage, FeedRequest, FeedService, PostDetail};
pub use submit::{SubmissionResult, SubmissionService};
