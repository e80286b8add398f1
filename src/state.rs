use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    /// HMAC secret for viewer bearer tokens.
    pub jwt_secret: String,
}
