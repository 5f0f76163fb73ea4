use std::sync::Arc;

use filepipe_queue::Dispatcher;
use filepipe_storage::FileStore;

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub files: Arc<FileStore>,
    /// Upper bound for a single multipart upload, in bytes.
    pub max_file_size: usize,
}
