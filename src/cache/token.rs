/// Upstream access token as handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: i64, // UNIX TIMESTAMP, safety margin already applied
}

impl AccessToken {
    pub fn new(value: String, expires_at: i64) -> Self {
        Self { value, expires_at }
    }

    /// Build a token from an exchange response received at `now`.
    pub fn from_lifetime(value: String, now: i64, expires_in: i64, safety_margin_seconds: i64) -> Self {
        Self::new(value, now + expires_in - safety_margin_seconds)
    }

    pub fn is_usable(&self, now: i64) -> bool {
        now < self.expires_at
    }
}
