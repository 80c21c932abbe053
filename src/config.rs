use std::{fmt, net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{bail, Context};
use jsonwebtoken::Algorithm;

/// Longest access-token lifetime accepted from the environment (one year).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

/// Where uploaded bytes end up.
#[derive(Clone)]
pub enum StorageConfig {
    Local {
        upload_dir: PathBuf,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        region: String,
    },
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageConfig::Local { upload_dir } => f
                .debug_struct("Local")
                .field("upload_dir", upload_dir)
                .finish(),
            StorageConfig::S3 {
                endpoint,
                bucket,
                region,
                ..
            } => f
                .debug_struct("S3")
                .field("endpoint", endpoint)
                .field("bucket", bucket)
                .field("region", region)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub storage: StorageConfig,
    pub max_upload_bytes: usize,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Read once at startup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;
        if secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        let jwt = JwtConfig {
            secret,
            algorithm: parse_algorithm(lookup("JWT_ALGORITHM").as_deref().unwrap_or("HS256"))?,
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 60)?,
        };
        if !(1..=MAX_TTL_MINUTES).contains(&jwt.ttl_minutes) {
            bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}");
        }

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_or(&lookup, "PASSWORD_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "PASSWORD_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "PASSWORD_PARALLELISM", defaults.parallelism)?,
        };

        let storage = match lookup("STORAGE_BACKEND").as_deref().unwrap_or("local") {
            "local" => StorageConfig::Local {
                upload_dir: lookup("UPLOAD_DIR")
                    .unwrap_or_else(|| "uploads".into())
                    .into(),
            },
            "s3" => StorageConfig::S3 {
                endpoint: required(&lookup, "MINIO_ENDPOINT")?,
                bucket: required(&lookup, "MINIO_BUCKET")?,
                access_key: required(&lookup, "MINIO_ACCESS_KEY")?,
                secret_key: required(&lookup, "MINIO_SECRET_KEY")?,
                region: lookup("MINIO_REGION").unwrap_or_else(|| "us-east-1".into()),
            },
            other => bail!("unknown STORAGE_BACKEND {other:?} (expected \"local\" or \"s3\")"),
        };

        let bind_addr = format!(
            "{}:{}",
            lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            lookup("APP_PORT").unwrap_or_else(|| "8080".into())
        )
        .parse()
        .context("APP_HOST/APP_PORT do not form a socket address")?;

        Ok(Self {
            database_url,
            jwt,
            password,
            storage,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            bind_addr,
        })
    }
}

#[cfg(test)]
impl AppConfig {
    /// Cheap Argon2 cost and a fixed secret.
    pub(crate) fn for_tests() -> Self {
        Self {
            database_url: "unused".into(),
            jwt: JwtConfig {
                secret: "unit-test-secret".into(),
                algorithm: Algorithm::HS256,
                ttl_minutes: 5,
            },
            password: PasswordConfig {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
            storage: StorageConfig::Local {
                upload_dir: "unused".into(),
            },
            max_upload_bytes: 64 * 1024,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        }
    }
}

fn required<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).with_context(|| format!("{key} is not set"))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")),
        None => Ok(default),
    }
}

// The secret is a shared string, so only the HMAC family makes sense.
fn parse_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let algorithm =
        Algorithm::from_str(raw).map_err(|_| anyhow::anyhow!("unknown JWT_ALGORITHM {raw:?}"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => bail!("JWT_ALGORITHM {other:?} is not an HMAC algorithm"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/documind"),
        ("JWT_SECRET", "dev-secret-change-me"),
    ];

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let cfg = AppConfig::from_lookup(lookup_from(BASE)).expect("config");
        assert_eq!(cfg.jwt.algorithm, Algorithm::HS256);
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.password, PasswordConfig::default());
        assert_eq!(cfg.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        match cfg.storage {
            StorageConfig::Local { upload_dir } => assert_eq!(upload_dir, PathBuf::from("uploads")),
            other => panic!("unexpected storage {other:?}"),
        }
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn rejects_non_hmac_algorithm() {
        let mut pairs = BASE.to_vec();
        pairs.push(("JWT_ALGORITHM", "RS256"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = BASE.to_vec();
        pairs.push(("JWT_ALGORITHM", "HS512"));
        let cfg = AppConfig::from_lookup(lookup_from(&pairs)).expect("config");
        assert_eq!(cfg.jwt.algorithm, Algorithm::HS512);
    }

    #[test]
    fn unparseable_ttl_is_an_error_not_a_default() {
        let mut pairs = BASE.to_vec();
        pairs.push(("JWT_TTL_MINUTES", "soon"));
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_MINUTES"));
    }

    #[test]
    fn ttl_outside_bounds_is_an_error() {
        for ttl in ["0", "-5", "525601", "10000000000"] {
            let mut pairs = BASE.to_vec();
            pairs.push(("JWT_TTL_MINUTES", ttl));
            let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_MINUTES"), "{ttl}: {err}");
        }

        let mut pairs = BASE.to_vec();
        pairs.push(("JWT_TTL_MINUTES", "525600"));
        let cfg = AppConfig::from_lookup(lookup_from(&pairs)).expect("one year is allowed");
        assert_eq!(cfg.jwt.ttl_minutes, MAX_TTL_MINUTES);
    }

    #[test]
    fn s3_backend_requires_credentials() {
        let mut pairs = BASE.to_vec();
        pairs.push(("STORAGE_BACKEND", "s3"));
        pairs.push(("MINIO_ENDPOINT", "http://localhost:9000"));
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("MINIO_BUCKET"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = AppConfig::from_lookup(lookup_from(BASE)).expect("config");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("dev-secret-change-me"));
        assert!(rendered.contains("<redacted>"));
    }
}
