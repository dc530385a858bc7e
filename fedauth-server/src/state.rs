use std::sync::Arc;

use crate::config::AuthConfig;
use crate::directory::Directory;
use crate::key_manager::KeyManager;
use crate::token::TokenCodec;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthConfig>,
    pub directory: Arc<dyn Directory>,
    pub keys: Arc<KeyManager>,
    pub codec: TokenCodec,
}

impl AppState {
    pub fn new(config: AuthConfig, directory: Arc<dyn Directory>, keys: Arc<KeyManager>) -> Self {
        let codec = TokenCodec::new(&config, Arc::clone(&keys));
        AppState {
            config: Arc::new(config),
            directory,
            keys,
            codec,
        }
    }
}
