use std::net::SocketAddr;
use std::path::PathBuf;

use envconfig::Envconfig;

// The service account key is not part of this: it is read from
// GOOGLE_SERVICE_ACCOUNT_KEY on each request, never at startup.
#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(default = "127.0.0.1:3000")]
    pub address: SocketAddr,

    #[envconfig(default = "camera/www")]
    pub static_dir: PathBuf,

    #[envconfig(default = "false")]
    pub log_json: bool,
}
