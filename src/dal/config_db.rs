use std::collections::{BTreeMap, HashMap};

use sqlx::PgPool;

use crate::domain::{
    ConfigurationError, FieldMapping, StoredConfig, API_KEY, CONFIG_KEYS, FIELD_MAPPINGS,
    SOURCE_FIELD, TABLE, VIEW,
};

pub async fn get_stored_config(pool: &PgPool) -> Result<StoredConfig, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        select
            key, value
        from
            configuration
        where
            key = any($1)
        "#,
    )
    .bind(CONFIG_KEYS.to_vec())
    .fetch_all(pool)
    .await?;

    Ok(stored_config_from(rows.into_iter().collect()))
}

fn stored_config_from(mut values: HashMap<String, String>) -> StoredConfig {
    let mut invalid = BTreeMap::new();

    let field_mappings = match values.remove(FIELD_MAPPINGS) {
        Some(raw) => match parse_mapping(&raw) {
            Ok(mapping) => Some(mapping),
            Err(e) => {
                log::error!("Stored field mappings are unreadable: {}", e);
                if let ConfigurationError::InvalidValue { key, reason } = e {
                    invalid.insert(key, reason);
                }
                None
            }
        },
        None => None,
    };

    StoredConfig {
        api_key: values.remove(API_KEY),
        table: values.remove(TABLE),
        view: values.remove(VIEW),
        source_field: values.remove(SOURCE_FIELD),
        field_mappings,
        invalid,
    }
}

fn parse_mapping(value: &str) -> Result<FieldMapping, ConfigurationError> {
    serde_json::from_str(value).map_err(|e| ConfigurationError::InvalidValue {
        key: FIELD_MAPPINGS.to_string(),
        reason: e.to_string(),
    })
}

pub fn normalize_config_value(key: &str, value: &str) -> Result<String, ConfigurationError> {
    if !CONFIG_KEYS.contains(&key) {
        return Err(ConfigurationError::InvalidValue {
            key: key.to_string(),
            reason: format!("unknown key, expected one of {}", CONFIG_KEYS.join(", ")),
        });
    }

    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigurationError::InvalidValue {
            key: key.to_string(),
            reason: "value is empty".to_string(),
        });
    }

    if key == FIELD_MAPPINGS {
        let mapping = parse_mapping(value)?;
        return serde_json::to_string(&mapping).map_err(|e| ConfigurationError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        });
    }

    Ok(value.to_string())
}

// View, source field and mappings all point into the selected table.
fn dependent_keys(key: &str) -> &'static [&'static str] {
    match key {
        TABLE => &[VIEW, SOURCE_FIELD, FIELD_MAPPINGS],
        _ => &[],
    }
}

fn keys_cleared_by(key: &str, previous: Option<&str>, value: &str) -> &'static [&'static str] {
    if previous == Some(value) {
        return &[];
    }
    dependent_keys(key)
}

pub async fn set_config_value(
    pool: &PgPool,
    key: &str,
    value: &str,
) -> Result<&'static [&'static str], sqlx::Error> {
    let mut tx = pool.begin().await?;

    let previous: Option<String> = sqlx::query_scalar(
        r#"
        select value from configuration where key = $1
        "#,
    )
    .bind(key)
    .fetch_optional(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        insert into configuration
            (key, value)
        values
            ($1, $2)
        on conflict(key) do update set
            value = $2
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(&mut *tx)
    .await?;

    let cleared = keys_cleared_by(key, previous.as_deref(), value);
    if !cleared.is_empty() {
        sqlx::query(
            r#"
            delete from configuration where key = any($1)
            "#,
        )
        .bind(cleared.to_vec())
        .execute(&mut *tx)
        .await?;
        log::info!("Changing {} cleared {}", key, cleared.join(", "));
    }

    tx.commit().await?;
    Ok(cleared)
}
