/// Web front end: the editor page and its JSON API, served with `axum`.
pub mod handlers;
pub mod page;
pub mod server;
