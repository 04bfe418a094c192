/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 生成资源 ID（UUID v4 字符串）
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
