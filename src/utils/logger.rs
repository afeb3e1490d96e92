use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "huat_leads=info,tower_http=info";
const VERBOSE_DIRECTIVE: &str = "huat_leads=debug,tower_http=debug,info";

/// `RUST_LOG` 優先，其次是設定檔的 level，最後才是預設值
fn build_filter(level: Option<&str>, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match (level, verbose) {
        (_, true) => EnvFilter::new(VERBOSE_DIRECTIVE),
        (Some(level), false) => EnvFilter::new(level),
        (None, false) => EnvFilter::new(DEFAULT_DIRECTIVE),
    })
}

pub fn init_logger(json: bool, level: Option<&str>, verbose: bool) {
    let filter = build_filter(level, verbose);
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json()) // Lambda 與集中式日誌使用 JSON 格式
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .init();
    }
}

pub fn init_cli_logger(verbose: bool) {
    init_logger(false, None, verbose);
}

pub fn init_json_logger() {
    init_logger(true, None, false);
}
