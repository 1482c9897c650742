//! Configuración de conexión a PostgreSQL
//!
//! Este módulo maneja la conexión a la base de datos y la aplicación
//! de migraciones al arrancar.

use anyhow::Result;
use sqlx::PgPool;

use crate::config::database::DatabaseConfig;

/// Conexión compartida a la base de datos
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Crear el pool de conexiones a partir de la configuración
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        log::info!("🔗 Conectando a la base de datos: {}", mask_database_url(&config.url));
        let pool = config.create_pool().await?;
        log::info!("✅ Base de datos conectada");
        Ok(Self { pool })
    }

    /// Crear la conexión leyendo `DATABASE_URL`
    pub async fn new_default() -> Result<Self> {
        let config = DatabaseConfig::from_env()?;
        Self::connect(&config).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ejecutar migraciones de la base de datos
    pub async fn run_migrations(&self) -> Result<()> {
        log::info!("📜 Aplicando migraciones...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        log::info!("✅ Migraciones aplicadas");
        Ok(())
    }
}

/// Función helper para enmascarar la URL de la base de datos en logs
fn mask_database_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if url[..at_pos].rfind(':').is_some() {
            let protocol = &url[..url.find("://").map(|p| p + 3).unwrap_or(0)];
            let host = &url[at_pos + 1..];
            format!("{}***:***@{}", protocol, host)
        } else {
            url.to_string()
        }
    } else {
        url.to_string()
    }
}
