pub mod user {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod chat {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

// Client-resident state: consumer là UI layer, không phải server binary.
#[allow(dead_code)]
pub mod client {
    pub mod state;
    pub mod unread;
}

pub mod realtime;
