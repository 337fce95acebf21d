pub const TABLE_NAME_ENV: &str = "DYNAMODB_TABLE";

/// Settings read once at process start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerConfig {
    /// `None` leaves the store unset; every store call then fails.
    pub table_name: Option<String>,
}

impl HandlerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let table_name = lookup(TABLE_NAME_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self { table_name }
    }
}
