// ==========================================
// 快递运价引擎 - 应用层
// ==========================================
// 职责: 装配共享状态，供命令行入口与宿主服务使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
