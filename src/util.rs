/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate an opaque resource id (UUID v4, hyphenated)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Round a monetary amount to two decimal places
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(10.126), 10.13);
        assert_eq!(round_money(10.124), 10.12);
        assert_eq!(round_money(0.0), 0.0);
    }

    #[test]
    fn test_new_id_unique() {
        assert_ne!(new_id(), new_id());
    }
}
