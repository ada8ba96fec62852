//! UPMS Server — connects storage, applies migrations and seeds the
//! root account.

use std::env;
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use upms_admin::{GroupService, ResourceService, RoleService, UserService};
use upms_auth::AuthConfig;
use upms_core::error::UpmsResult;
use upms_core::models::user::CreateUser;
use upms_db::{
    DbConfig, DbError, DbManager, SurrealGroupRepository, SurrealResourceRepository,
    SurrealRoleRepository, SurrealUserRepository,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("upms=info".parse().unwrap()))
        .json()
        .init();

    info!("Starting UPMS...");

    match run().await {
        Ok(()) => {
            info!("UPMS bootstrap complete.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "UPMS bootstrap failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> UpmsResult<()> {
    let db_config = DbConfig::from_env();
    let manager = DbManager::connect(&db_config).await.map_err(DbError::from)?;
    let db = manager.client().clone();

    upms_db::run_migrations(&db).await?;

    let resources = ResourceService::new(SurrealResourceRepository::new(db.clone()));
    let roles = RoleService::new(SurrealRoleRepository::new(db.clone()), resources.clone());
    let groups = GroupService::new(SurrealGroupRepository::new(db.clone()));
    let users = UserService::new(
        SurrealUserRepository::new(db),
        roles,
        resources,
        groups,
        AuthConfig::default(),
    );

    let (Ok(name), Ok(password)) = (env::var("UPMS_ROOT_USER"), env::var("UPMS_ROOT_PASSWORD"))
    else {
        warn!("UPMS_ROOT_USER / UPMS_ROOT_PASSWORD not set; skipping root account seeding");
        return Ok(());
    };

    if let Some(existing) = users.find_by_name(&name).await? {
        info!(user_id = %existing.id, name = %existing.name, "root account already present");
        return Ok(());
    }

    let root = users
        .create_top_level(CreateUser {
            name,
            password,
            lock_ip: env::var("UPMS_ROOT_LOCK_IP").unwrap_or_default(),
            ..Default::default()
        })
        .await?;
    info!(user_id = %root.id, name = %root.name, "root account seeded");

    Ok(())
}
