//! Feed domain model and the remote sources that produce it.

pub mod api_types;
mod client;
mod remote;
mod types;

pub use api_types::HttpResponse;
pub use client::{HttpClient, ReqwestClient};
pub use remote::{RemoteFeedLoader, RemoteImageCommentsLoader, RemoteImageDataLoader, DEFAULT_PAGE_SIZE};
pub use types::{FeedImage, ImageComment};
