pub mod endpoints;
pub mod exam_client;

pub use endpoints::ApiEndpoints;
pub use exam_client::ExamApiClient;
