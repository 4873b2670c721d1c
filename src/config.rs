use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

// Catalog service configuration sourced from environment variables, with an
// optional YAML override file.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub products_collection: String,
    pub users_collection: String,
    pub search_index: String,
}

#[derive(Debug, Deserialize)]
struct CatalogConfigOverride {
    bind_addr: Option<String>,
    jwt_secret: Option<String>,
    products_collection: Option<String>,
    users_collection: Option<String>,
    search_index: Option<String>,
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("CATALOG_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse CATALOG_BIND")?;
        let jwt_secret =
            std::env::var("CATALOG_JWT_SECRET").unwrap_or_else(|_| "dev-secret".to_string());
        let products_collection =
            std::env::var("CATALOG_PRODUCTS_COLLECTION").unwrap_or_else(|_| "products".to_string());
        let users_collection =
            std::env::var("CATALOG_USERS_COLLECTION").unwrap_or_else(|_| "users".to_string());
        let search_index =
            std::env::var("CATALOG_SEARCH_INDEX").unwrap_or_else(|_| "products".to_string());
        Ok(Self {
            bind_addr,
            jwt_secret,
            products_collection,
            users_collection,
            search_index,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("CATALOG_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read CATALOG_CONFIG: {path}"))?;
            let override_cfg: CatalogConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse catalog config yaml")?;
            config.apply(override_cfg)?;
        }
        Ok(config)
    }

    fn apply(&mut self, override_cfg: CatalogConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.jwt_secret {
            self.jwt_secret = value;
        }
        if let Some(value) = override_cfg.products_collection {
            self.products_collection = value;
        }
        if let Some(value) = override_cfg.users_collection {
            self.users_collection = value;
        }
        if let Some(value) = override_cfg.search_index {
            self.search_index = value;
        }
        Ok(())
    }
}
