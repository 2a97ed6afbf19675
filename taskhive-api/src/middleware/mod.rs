/// Request middleware
///
/// - `auth`: access-token authentication, inserts `Actor`/`User` extensions

pub mod auth;
