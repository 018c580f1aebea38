pub mod session;

pub use session::SubmissionSession;
