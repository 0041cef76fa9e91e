use std::path::Path;

use anyhow::Result;
use exam_session::utils::logging;
use exam_session::workflow::SessionOutcome;
use exam_session::{App, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：命令行给出 TOML 路径时读文件，否则只读环境变量
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_toml_file(Path::new(&path)).await?,
        None => Config::from_env()?,
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    match App::initialize(config).await?.run().await? {
        SessionOutcome::Submitted(report) => {
            info!("成绩已写入结果文件 (试卷 {})", report.test_id);
        }
        SessionOutcome::Abandoned => info!("考试未交卷即退出"),
    }

    Ok(())
}
