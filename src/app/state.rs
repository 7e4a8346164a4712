// ==========================================
// 快递运价引擎 - 应用状态
// ==========================================
// 职责: 打开共享连接、建表，装配 Repository / Engine / API
// ==========================================

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{PricingApi, RateAdminApi, TariffAdminApi};
use crate::config::{ConfigManager, PricingConfigReader};
use crate::engine::{
    CompanyProfileSource, RateRecordSource, SlabTariffResolver, SlabTariffSource, ZoneRateResolver,
};
use crate::repository::{CompanyProfileRepository, RateRecordRepository, SlabTariffRepository};

/// 应用状态
///
/// 所有仓储共享同一连接（Arc<Mutex<Connection>>）
pub struct AppState {
    /// 数据库路径（内存库为 ":memory:"）
    pub db_path: String,

    /// 计费API
    pub pricing_api: Arc<PricingApi>,

    /// 阶梯运价整表替换API
    pub tariff_admin_api: Arc<TariffAdminApi>,

    /// 运价管理API
    pub rate_admin_api: Arc<RateAdminApi>,

    /// 配置管理器（加盟商级覆写）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Err(String): 打开数据库或建表失败
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let state = Self::from_connection(Arc::new(Mutex::new(conn)), db_path)?;

        tracing::info!("AppState初始化完成");
        Ok(state)
    }

    /// 基于已有连接装配（测试可传入内存库）
    pub fn from_connection(conn: Arc<Mutex<Connection>>, db_path: String) -> Result<Self, String> {
        {
            let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::ensure_schema(&guard).map_err(|e| format!("建表失败: {}", e))?;
        }

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let rate_repo = Arc::new(RateRecordRepository::from_connection(conn.clone()));
        let slab_repo = Arc::new(SlabTariffRepository::from_connection(conn.clone()));
        let profile_repo = Arc::new(CompanyProfileRepository::from_connection(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let rate_source: Arc<dyn RateRecordSource> = rate_repo.clone();
        let slab_source: Arc<dyn SlabTariffSource> = slab_repo.clone();
        let profile_source: Arc<dyn CompanyProfileSource> = profile_repo.clone();

        let zone_resolver = Arc::new(ZoneRateResolver::new(rate_source));
        let slab_resolver = Arc::new(SlabTariffResolver::new(slab_source));

        // ==========================================
        // 初始化API层
        // ==========================================
        let config_reader: Arc<dyn PricingConfigReader> = config_manager.clone();
        let pricing_api = Arc::new(PricingApi::new(zone_resolver, slab_resolver, profile_source));
        let tariff_admin_api = Arc::new(TariffAdminApi::new(slab_repo.clone(), config_reader));
        let rate_admin_api = Arc::new(RateAdminApi::new(rate_repo, profile_repo, slab_repo));

        Ok(Self {
            db_path,
            pricing_api,
            tariff_admin_api,
            rate_admin_api,
            config_manager,
        })
    }
}

/// 默认数据库路径
///
/// 优先环境变量 COURIER_RATES_DB_PATH，其次用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("COURIER_RATES_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./courier_rates.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("courier-rate-engine");
        if ensure_data_dir(&dir) {
            path = dir.join("courier_rates.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 创建数据目录；失败时记录原因并返回 false（调用方回退到当前目录）
fn ensure_data_dir(dir: &Path) -> bool {
    match std::fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "数据目录创建失败，回退到当前目录");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_ensure_data_dir_reports_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        assert!(ensure_data_dir(&nested));
        assert!(nested.is_dir());

        // 父路径是普通文件时无法创建
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(!ensure_data_dir(&file.join("sub")));
    }

    #[test]
    fn test_from_in_memory_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::from_connection(Arc::new(Mutex::new(conn)), ":memory:".to_string())
            .unwrap();
        assert!(state
            .rate_admin_api
            .list_rate_records(1, None)
            .unwrap()
            .is_empty());
    }
}
