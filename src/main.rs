// src/main.rs
use oficina_api::{create_router, db, services::user_service, AppState, Config};
use std::env;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            env::var("RUST_LOG")
                .unwrap_or_else(|_| "oficina_api=debug,tower_http=info,sqlx=warn".into())
                .into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando servidor de oficinas...");

    let config = Config::from_env().map_err(|e| {
        tracing::error!("❌ Configuração inválida: {}", e);
        anyhow::anyhow!("Configuração inválida: {}", e)
    })?;

    // --- Configuração da Base de Dados ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    if let Some(seed) = &config.admin_seed {
        user_service::ensure_admin(&db_pool, seed, config.bcrypt_cost)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar conta de administrador: {}", e))?;
    }

    tokio::fs::create_dir_all(&config.certificates_dir).await?;
    tracing::info!("📂 Certificados em {}", config.certificates_dir.display());

    // --- Criação do Estado da Aplicação ---
    let app_state = AppState::new(db_pool, &config);

    // --- Configuração do Endereço e Listener ---
    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", config.bind_addr, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Servidor escutando em http://{}", config.bind_addr);

    // --- Router + Middlewares ---
    let app = create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            // O front-end React é servido noutra origem
            .layer(CorsLayer::permissive()),
    );

    // --- Início do Servidor ---
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}
