//! Logging Infrastructure
//!
//! `RUST_LOG` 优先；未设置时按 `LOG_LEVEL` 过滤本服务和 tower_http 的日志。
//! 设置 `LOG_DIR` 后写入按天滚动的文件，生产环境输出 JSON。

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger
///
/// Must be called once, before any other tracing call.
pub fn init_logger(log_level: &str, json: bool, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let appender = log_dir.and_then(|dir| {
        let path = Path::new(dir);
        match std::fs::create_dir_all(path) {
            Ok(()) => Some(tracing_appender::rolling::daily(path, "pos-server")),
            Err(e) => {
                eprintln!("Cannot create log dir {}: {}, logging to stdout", dir, e);
                None
            }
        }
    });

    match (json, appender) {
        (true, Some(file)) => builder.json().with_writer(file).init(),
        (true, None) => builder.json().init(),
        (false, Some(file)) => builder.with_ansi(false).with_writer(file).init(),
        (false, None) => builder.init(),
    }
}

fn default_directives(log_level: &str) -> String {
    let level = match log_level.to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error") => l.to_string(),
        _ => "info".to_string(),
    };
    format!("pos_server={level},shared={level},tower_http={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives("DEBUG"),
            "pos_server=debug,shared=debug,tower_http=debug"
        );
        assert_eq!(
            default_directives("verbose"),
            "pos_server=info,shared=info,tower_http=info"
        );
    }
}
