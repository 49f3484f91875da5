#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub auth_url: String,
    pub items_url: String,
    pub prices_url: String,
    pub erp_username: String,
    pub erp_password: String,
    pub sucursal: String,
    pub bodega: String,
    pub empresa: Option<String>,
    pub table_prefix: String,
    pub page_size: u32,
    pub chunk_size: usize,
    pub max_concurrent_chunks: usize,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub http_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("auth_url", &self.auth_url)
            .field("items_url", &self.items_url)
            .field("prices_url", &self.prices_url)
            .field("erp_username", &self.erp_username)
            .field("erp_password", &"[redacted]")
            .field("sucursal", &self.sucursal)
            .field("bodega", &self.bodega)
            .field("empresa", &self.empresa)
            .field("table_prefix", &self.table_prefix)
            .field("page_size", &self.page_size)
            .field("chunk_size", &self.chunk_size)
            .field("max_concurrent_chunks", &self.max_concurrent_chunks)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}
