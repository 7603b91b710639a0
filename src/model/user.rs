/// Columns needed to authenticate a user and mint tokens.
#[derive(Debug, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    pub employee_id: Option<u64>,
    pub is_active: bool,
}
