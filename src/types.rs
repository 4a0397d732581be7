use crate::store::CrmStore;

use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn CrmStore>,
}
