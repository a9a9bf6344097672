use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;
use std::time::Duration;

/// Expected user count and false-positive rate. Tune against real data.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

const CACHE_CAPACITY: u64 = 500_000;
const CACHE_TTL_SECS: u64 = 86_400;

/// Two-tier in-memory index over taken usernames:
/// a cuckoo filter gives fast definite negatives, a moka cache gives
/// fast positives for recently seen names. The database is the fallback.
struct UsernameIndex {
    filter: RwLock<CuckooFilter<String>>,
    taken: Cache<String, bool>,
}

static INDEX: Lazy<UsernameIndex> = Lazy::new(|| UsernameIndex {
    filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
    taken: Cache::builder()
        .max_capacity(CACHE_CAPACITY)
        .time_to_live(Duration::from_secs(CACHE_TTL_SECS))
        .build(),
});

#[inline]
fn normalize(username: &str) -> String {
    username.to_lowercase()
}

/// Record a username as taken in both tiers.
pub async fn mark_taken(username: &str) {
    let username = normalize(username);
    INDEX
        .filter
        .write()
        .expect("username filter poisoned")
        .add(&username);
    INDEX.taken.insert(username, true).await;
}

/// true  => username AVAILABLE
/// false => username TAKEN
pub async fn is_available(username: &str, pool: &MySqlPool) -> bool {
    let username = normalize(username);

    // Definite negative: the filter has never seen this name.
    if !INDEX
        .filter
        .read()
        .expect("username filter poisoned")
        .contains(&username)
    {
        return true;
    }

    // Fast positive from the cache.
    if INDEX.taken.get(&username).await.unwrap_or(false) {
        return false;
    }

    // Filter said "maybe": settle it against the database, fail-safe to taken.
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
    )
    .bind(&username)
    .fetch_one(pool)
    .await
    .unwrap_or(true);

    !exists
}

/// Stream all usernames into the filter at startup.
pub async fn warmup_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT username FROM users").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (username,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
        batch.push(normalize(&username));
        total += 1;

        if batch.len() == batch_size {
            fill_filter(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        fill_filter(&batch);
    }

    log::info!("Username filter warmup complete: {} users", total);
    Ok(())
}

/// Preload only recently active usernames into the positive cache.
pub async fn warmup_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT username
        FROM users
        WHERE last_login_at >= NOW() - INTERVAL ? DAY
        ORDER BY last_login_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (username,) = row?;
        batch.push(normalize(&username));
        total += 1;

        if batch.len() >= batch_size {
            fill_cache(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        fill_cache(&batch).await;
    }

    log::info!(
        "Username cache warmup complete: {} recent users (last {} days)",
        total,
        days
    );
    Ok(())
}

fn fill_filter(usernames: &[String]) {
    let mut filter = INDEX.filter.write().expect("username filter poisoned");
    for username in usernames {
        filter.add(username);
    }
}

async fn fill_cache(usernames: &[String]) {
    let inserts: Vec<_> = usernames
        .iter()
        .map(|u| INDEX.taken.insert(u.clone(), true))
        .collect();
    futures::future::join_all(inserts).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn mark_taken_is_visible_in_both_tiers() {
        mark_taken("Alice").await;
        assert!(
            INDEX
                .filter
                .read()
                .unwrap()
                .contains(&normalize("ALICE"))
        );
        assert!(INDEX.taken.get(&normalize("alice")).await.unwrap_or(false));
    }

    #[test]
    fn normalization_is_case_insensitive() {
        assert_eq!(normalize("JohnDoe"), "johndoe");
    }
}
