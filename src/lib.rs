pub mod config;
pub mod error;
pub mod state;
pub mod db;
pub mod device;

pub mod crypto {
    pub mod token;
}

pub mod models {
    pub mod user;
    pub mod session;
}

pub mod repositories {
    pub mod user;
    pub mod session;
}

pub mod services {
    pub mod auth;
    pub mod sessions;
}

pub mod handlers {
    pub mod auth;
    pub mod sessions;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod rate_limit;
}

pub mod validation {
    pub mod auth;
    pub mod pagination;
}
