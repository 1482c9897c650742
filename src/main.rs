use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use restaurant_delivery::config::database::DatabaseConfig;
use restaurant_delivery::config::environment::{EnvironmentConfig, StorageBackend};
use restaurant_delivery::database::DatabaseConnection;
use restaurant_delivery::repositories::InMemoryStore;
use restaurant_delivery::routes::create_router;
use restaurant_delivery::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let level = if config.is_development() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🍔 Restaurant Delivery - Domicilios y cobro de órdenes");
    info!("=====================================================");

    let app_state = match config.storage {
        StorageBackend::Postgres => {
            let db_connection = match DatabaseConfig::from_env() {
                Ok(db_config) => DatabaseConnection::connect(&db_config).await,
                Err(e) => Err(e),
            };
            let db_connection = match db_connection {
                Ok(conn) => conn,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            db_connection.run_migrations().await?;
            AppState::postgres(db_connection.pool().clone(), config.clone())?
        }
        StorageBackend::Memory => {
            warn!("⚠️ Almacenamiento en memoria: los datos se pierden al reiniciar");
            warn!("⚠️ Sin configuración del restaurante hasta que se haga PUT /api/config");
            AppState::in_memory(config.clone(), Arc::new(InMemoryStore::new()))?
        }
    };

    if config.routing_api_key.is_none() {
        warn!("⚠️ ROUTING_API_KEY no configurada: las distancias se estimarán en línea recta");
    }

    let app = create_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("🛵 Domicilios:");
    info!("   POST /api/delivery/quote - Cotizar por dirección");
    info!("   POST /api/delivery/quote/coordinates - Cotizar por coordenadas");
    info!("   GET  /api/delivery/reverse - Dirección de unas coordenadas");
    info!("   POST /api/delivery/cache/cleanup - Limpiar cachés");
    info!("⚙️ Configuración:");
    info!("   GET  /api/config - Configuración activa");
    info!("   PUT  /api/config - Actualizar configuración");
    info!("🧾 Órdenes:");
    info!("   POST /api/orders - Crear orden");
    info!("   GET  /api/orders/by-phone/:phone - Última orden de un teléfono");
    info!("   POST /api/orders/:id/cancel - Cancelar orden");
    info!("   PUT  /api/orders/:id/status - Avanzar estado");
    info!("   POST /api/orders/:id/settle - Liquidar orden");
    info!("   POST /api/orders/:id/print - Registrar impresión");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo escuchar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
